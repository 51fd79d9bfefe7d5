//! Shared frontend support for the Basketlytics web app: API base URL
//! selection and the persisted auth token store.

pub mod auth;
pub mod components;
pub mod config;
pub mod error;
pub mod logging;

pub use auth::{
    AuthStatus, AuthTokenProvider, AuthTokenStore, HostContext, StoreOptions, Subscription,
    TokenStorage,
};
pub use components::LogoutButton;
pub use config::{AuthConfig, Environment, FrontendConfig, resolve_base_url};
pub use error::{ConfigError, NavigationError, StorageError};
pub use logging::init_logging;
