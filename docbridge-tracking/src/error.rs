//! Error types for change tracking.

use docbridge_compare::CompareError;
use docbridge_model::ModelError;
use docbridge_types::EntryId;
use thiserror::Error;

/// Result type for tracking operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Errors raised by the entry tracker.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The entry is not tracked.
    #[error("entry not tracked: {0}")]
    UnknownEntry(EntryId),

    /// The kind does not declare the property.
    #[error("kind {kind} has no property {property}")]
    UnknownProperty { kind: String, property: String },

    /// A property comparer rejected a value.
    #[error("comparison failed: {0}")]
    Compare(#[from] CompareError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
