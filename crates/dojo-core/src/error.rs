//! Error types for dojo-core

use thiserror::Error;

/// Result type alias using dojo-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dojo-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transient network failure (timeout, DNS, refused, service unavailable)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store rejected the caller (permission denied / unauthenticated)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Non-success response from the remote store that is neither auth nor transient
    #[error("Remote API error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// A single remote document could not be decoded
    #[error("Validation error: {0}")]
    Validation(String),

    /// Mutation attempted by someone who neither owns the record nor is an admin
    #[error("Permission denied: {caller_id} does not own record {record_id}")]
    Ownership { record_id: String, caller_id: String },

    /// Local cache error
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Identity/auth boundary error
    #[error("Auth error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an ownership error for the given record and caller
    pub fn ownership(record_id: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self::Ownership {
            record_id: record_id.into(),
            caller_id: caller_id.into(),
        }
    }

    /// Whether the remote store denied access to the caller.
    pub const fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether this is a local storage failure.
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Database(_))
    }

    /// Whether this failure is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            crate::retry::default_classify(self),
            crate::retry::RetryClass::Retryable
        )
    }
}
