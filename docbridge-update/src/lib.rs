//! The docbridge save pipeline.
//!
//! Turns a batch of tracked entries into document store operations:
//! - [`DocumentProjector`] builds and merges document bodies and identities
//! - [`ChangeSetProcessor`] walks the batch, folds nested changes into
//!   their root documents and dispatches create/replace/delete calls
//! - [`ConcurrencyListener`] decides whether optimistic-concurrency
//!   failures abort the batch

mod batch;
mod error;
mod listener;
mod options;
mod processor;
mod projector;

pub use error::{ProjectionError, ProjectionResult, UpdateError, UpdateResult};
pub use listener::{ConcurrencyListener, ConflictResolution, PropagateConflicts, SuppressConflicts};
pub use options::SaveOptions;
pub use processor::ChangeSetProcessor;
pub use projector::DocumentProjector;
