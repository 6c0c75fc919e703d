//! Error types for the booklist manager
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for booklist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the booklist manager
#[derive(Error, Debug)]
pub enum Error {
    /// Table store errors (query rejected, malformed row, ...)
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O errors (file-backed store)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors (remote store)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Table or row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflicting write rejected by the store
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Backend-specific error
    #[error("Backend error ({store}): {message}")]
    Backend {
        /// Store backend name
        store: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a backend-specific error
    pub fn backend(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same request later could succeed
    ///
    /// The sync layer never retries on its own; front ends may use this
    /// to decide whether to offer a manual reload.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::RateLimited(_) | Self::Io(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
