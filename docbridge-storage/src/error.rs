//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by a document store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No document with this id exists in the target.
    #[error("document {id} not found in {target}")]
    NotFound { target: String, id: String },

    /// A document with this id already exists in the target.
    #[error("document {id} already exists in {target}")]
    Conflict { target: String, id: String },

    /// The document changed since it was read.
    #[error("precondition failed for document {id} in {target}")]
    PreconditionFailed { target: String, id: String },

    /// The store could not be reached or refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

impl StorageError {
    /// Whether the error reports an optimistic-concurrency failure.
    pub fn is_precondition_failure(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}
