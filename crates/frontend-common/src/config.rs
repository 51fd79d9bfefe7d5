//! Frontend configuration
//!
//! Selects the API base URL for the current build and carries the auth
//! constants shared by the token store and the UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Backend endpoint used while developing locally
pub const DEV_API_BASE_URL: &str = "http://localhost:5000";

/// Public backend endpoint
pub const PROD_API_BASE_URL: &str = "http://basketlytics.duckdns.org:5000";

/// Resolve the API base URL from the "running in development" flag
#[must_use]
pub const fn resolve_base_url(is_development: bool) -> &'static str {
    if is_development {
        DEV_API_BASE_URL
    } else {
        PROD_API_BASE_URL
    }
}

/// Build environment the frontend was compiled for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Environment selected at compile time.
    ///
    /// `BASKETLYTICS_ENV` wins when it is set to a known name; otherwise debug
    /// builds are development builds and release builds are production builds.
    #[must_use]
    pub fn from_build() -> Self {
        Self::from_override(option_env!("BASKETLYTICS_ENV"))
    }

    fn from_override(value: Option<&str>) -> Self {
        match value.map(str::parse::<Self>) {
            Some(Ok(environment)) => environment,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ignoring environment override");
                Self::from_profile()
            }
            None => Self::from_profile(),
        }
    }

    const fn from_profile() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Base URL of the backend for this environment
    #[must_use]
    pub const fn api_base_url(self) -> &'static str {
        resolve_base_url(self.is_development())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_profile()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Authentication configuration
pub struct AuthConfig;

impl AuthConfig {
    /// Local storage key holding the raw auth token
    pub const TOKEN_STORAGE_KEY: &'static str = "token";

    /// Path the browser is sent to on forced logout
    pub const LOGIN_PATH: &'static str = "/login";
}

/// Runtime view of the frontend configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub environment: Environment,
    pub token_storage_key: String,
    pub login_path: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            token_storage_key: AuthConfig::TOKEN_STORAGE_KEY.to_string(),
            login_path: AuthConfig::LOGIN_PATH.to_string(),
        }
    }
}

impl FrontendConfig {
    /// Load the configuration from compile-time environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            environment: Environment::from_build(),
            token_storage_key: option_env!("BASKETLYTICS_TOKEN_KEY")
                .unwrap_or(AuthConfig::TOKEN_STORAGE_KEY)
                .to_string(),
            login_path: option_env!("BASKETLYTICS_LOGIN_PATH")
                .unwrap_or(AuthConfig::LOGIN_PATH)
                .to_string(),
        }
    }

    #[must_use]
    pub const fn api_base_url(&self) -> &'static str {
        self.environment.api_base_url()
    }
}
