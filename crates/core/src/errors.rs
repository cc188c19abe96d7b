//! Error types shared across the seatplan crates.

use thiserror::Error;

/// Result type alias for seatplan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core and its adapters.
#[derive(Debug, Error)]
pub enum Error {
    /// A mutation was rejected before any state change occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The durable store failed; in-memory state stays authoritative.
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}
