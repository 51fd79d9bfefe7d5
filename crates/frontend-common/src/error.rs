//! Error types for the frontend support crate
//!
//! None of these reach callers of the token store: the store logs and
//! swallows them. They are surfaced by the storage and navigation backends so
//! that hosts plugging in their own backends can tell failures apart.

use thiserror::Error;

/// Failure of a persisted storage backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("persistent storage is not available")]
    Unavailable,

    #[error("storage operation on key '{key}' failed: {message}")]
    Operation { key: String, message: String },
}

impl StorageError {
    /// Create an operation error for `key`
    pub fn operation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failure of a client-side navigation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("no browsing context to navigate")]
    Unavailable,

    #[error("navigation to '{path}' was rejected: {message}")]
    Rejected { path: String, message: String },
}

impl NavigationError {
    /// Create a rejected navigation error for `path`
    pub fn rejected(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Invalid frontend configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown environment '{0}', expected 'development' or 'production'")]
    UnknownEnvironment(String),
}
