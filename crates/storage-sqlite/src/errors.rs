//! Storage error mapping into the core error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for seatplan_core::Error {
    fn from(err: StorageError) -> Self {
        seatplan_core::Error::Storage(err.to_string())
    }
}
