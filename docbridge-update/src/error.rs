//! Error types for the save pipeline.

use docbridge_model::ModelError;
use docbridge_storage::StorageError;
use docbridge_tracking::TrackingError;
use docbridge_types::EntryId;
use thiserror::Error;

/// Result type for body and identity projection.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Result type for saving a batch.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Errors raised while projecting an entry onto a document.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A key property has no value, so the document has no identity.
    #[error("key property {property} of {kind} has no value")]
    MissingKeyValue { kind: String, property: String },

    /// A key property holds an object or array, which has no id rendering.
    #[error("key property {property} of {kind} is not a scalar")]
    NonScalarKeyValue { kind: String, property: String },

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors raised while saving a batch.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// A nested entry has no tracked owner, so there is no document to
    /// embed it in. Raised before any store call.
    #[error(
        "nested {kind} entry{} is not owned by any tracked {owner} entry",
        key_suffix(.key_values)
    )]
    OrphanedDocument {
        kind: String,
        owner: String,
        /// Only filled in when sensitive data logging is enabled.
        key_values: Option<String>,
    },

    /// The store rejected a write because the document changed or vanished.
    #[error("concurrency conflict saving {kind} document {id}: {source}")]
    Concurrency {
        entry: EntryId,
        kind: String,
        id: String,
        #[source]
        source: StorageError,
    },

    /// The store failed to apply a write.
    #[error("failed to save {kind} document {id}: {source}")]
    Store {
        entry: EntryId,
        kind: String,
        id: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to project {kind} entry {entry}: {source}")]
    Projection {
        entry: EntryId,
        kind: String,
        #[source]
        source: ProjectionError,
    },

    /// The save was cancelled; `affected` writes had already been applied.
    #[error("save cancelled after {affected} documents")]
    Cancelled { affected: usize },

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

fn key_suffix(key_values: &Option<String>) -> String {
    key_values
        .as_deref()
        .map(|k| format!(" with key values {k}"))
        .unwrap_or_default()
}

impl UpdateError {
    /// Whether this is an optimistic-concurrency failure.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Self::Concurrency { .. })
    }
}
