//! Error types for value comparison.

use thiserror::Error;

/// Result type for comparison operations.
pub type CompareResult<T> = Result<T, CompareError>;

/// Errors raised while comparing, hashing or snapshotting a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    /// The value does not have the shape the comparer was built for.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Shape the comparer accepts (e.g. `map<string, i64>`).
        expected: String,
        /// Shape of the value actually supplied.
        actual: String,
    },
}
