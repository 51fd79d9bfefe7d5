//! Authentication module

pub mod context;
pub mod host;
pub mod navigation;
pub mod storage;
pub mod store;

// Re-export commonly used items
pub use context::{
    AuthTokenProvider, AuthTokenProviderProps, use_auth_store, use_auth_token,
    use_is_authenticated,
};
pub use host::HostContext;
pub use navigation::{BrowserNavigator, Navigator, RecordingNavigator};
pub use storage::{BrowserStorage, MemoryStorage, TokenStorage};
pub use store::{AuthStatus, AuthTokenStore, StoreOptions, SubscriberId, Subscription};
