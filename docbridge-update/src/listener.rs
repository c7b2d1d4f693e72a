//! Hooks for optimistic-concurrency failures.

use crate::error::UpdateError;

/// What to do with a concurrency conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Skip the entry and keep saving the batch.
    Suppress,
    /// Abort the batch with the error.
    Propagate,
}

/// Observes concurrency conflicts raised while saving a batch.
///
/// Only [`UpdateError::Concurrency`] is ever passed in.
pub trait ConcurrencyListener: Send + Sync {
    fn on_conflict(&self, error: &UpdateError) -> ConflictResolution;
}

impl<F> ConcurrencyListener for F
where
    F: Fn(&UpdateError) -> ConflictResolution + Send + Sync,
{
    fn on_conflict(&self, error: &UpdateError) -> ConflictResolution {
        self(error)
    }
}

/// Aborts on every conflict.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropagateConflicts;

impl ConcurrencyListener for PropagateConflicts {
    fn on_conflict(&self, _error: &UpdateError) -> ConflictResolution {
        ConflictResolution::Propagate
    }
}

/// Skips every conflicting entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuppressConflicts;

impl ConcurrencyListener for SuppressConflicts {
    fn on_conflict(&self, _error: &UpdateError) -> ConflictResolution {
        ConflictResolution::Suppress
    }
}
