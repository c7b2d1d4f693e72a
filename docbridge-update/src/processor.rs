//! Change set processing.
//!
//! [`ChangeSetProcessor`] saves a batch of tracked entries through a
//! document store, one root document at a time, in batch order.

use crate::batch::{SaveBatch, Write};
use crate::error::{ProjectionError, UpdateError, UpdateResult};
use crate::listener::{ConcurrencyListener, ConflictResolution, PropagateConflicts};
use crate::options::SaveOptions;
use crate::projector::DocumentProjector;
use docbridge_model::Model;
use docbridge_storage::{AsyncDocumentStore, DocumentStore, StorageError, StorageResult};
use docbridge_tracking::{EntryTracker, TrackedEntry};
use docbridge_types::{Document, EntryId, EntryState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A store call prepared for one root entry.
#[derive(Debug)]
enum Operation {
    Create {
        target: String,
        id: String,
        body: Document,
    },
    Replace {
        target: String,
        id: String,
        body: Document,
    },
    Delete {
        target: String,
        id: String,
    },
}

impl Operation {
    fn id(&self) -> &str {
        match self {
            Self::Create { id, .. } | Self::Replace { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Replace { .. } => "replace",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Saves batches of tracked entries to a document store.
pub struct ChangeSetProcessor<S: ?Sized> {
    store: Arc<S>,
    projector: DocumentProjector,
    listener: Arc<dyn ConcurrencyListener>,
}

impl<S: ?Sized> ChangeSetProcessor<S> {
    pub fn new(store: Arc<S>, model: Arc<Model>, options: SaveOptions) -> Self {
        Self {
            store,
            projector: DocumentProjector::new(model, options),
            listener: Arc::new(PropagateConflicts),
        }
    }

    /// Replaces the listener consulted on concurrency conflicts.
    pub fn with_listener(mut self, listener: Arc<dyn ConcurrencyListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn projector(&self) -> &DocumentProjector {
        &self.projector
    }

    /// Saves `batch` and returns the number of documents written.
    ///
    /// Nested entries cause their root document to be rewritten; a root is
    /// never written twice. A store failure aborts the batch unless it is a
    /// concurrency conflict the listener suppresses.
    pub fn save_changes(&self, tracker: &mut EntryTracker, batch: &[EntryId]) -> UpdateResult<usize>
    where
        S: DocumentStore,
    {
        let mut plan = SaveBatch::plan(tracker, &self.projector, batch)?;
        while let Some(write) = plan.next_write(tracker)? {
            let Some(operation) = self.prepare(tracker, write)? else {
                continue;
            };
            let result = match &operation {
                Operation::Create { target, id, body } => self.store.create_item(target, body, id),
                Operation::Replace { target, id, body } => self.store.replace_item(target, id, body),
                Operation::Delete { target, id } => self.store.delete_item(target, id),
            };
            self.complete(tracker, &mut plan, write, operation, result)?;
        }

        info!("Saved {} documents for a batch of {} entries", plan.affected(), batch.len());
        Ok(plan.affected())
    }

    /// Async variant of [`save_changes`](Self::save_changes).
    ///
    /// `cancel` is checked before every store call and raced against it.
    /// Cancellation yields [`UpdateError::Cancelled`] with the number of
    /// writes already applied.
    pub async fn save_changes_async(
        &self,
        tracker: &mut EntryTracker,
        batch: &[EntryId],
        cancel: &CancellationToken,
    ) -> UpdateResult<usize>
    where
        S: AsyncDocumentStore,
    {
        let mut plan = SaveBatch::plan(tracker, &self.projector, batch)?;
        while let Some(write) = plan.next_write(tracker)? {
            if cancel.is_cancelled() {
                return Err(UpdateError::Cancelled {
                    affected: plan.affected(),
                });
            }
            let Some(operation) = self.prepare(tracker, write)? else {
                continue;
            };
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(UpdateError::Cancelled { affected: plan.affected() });
                }
                result = self.dispatch_async(&operation, cancel) => result,
            };
            self.complete(tracker, &mut plan, write, operation, result)?;
        }

        info!("Saved {} documents for a batch of {} entries", plan.affected(), batch.len());
        Ok(plan.affected())
    }

    async fn dispatch_async(
        &self,
        operation: &Operation,
        cancel: &CancellationToken,
    ) -> StorageResult<bool>
    where
        S: AsyncDocumentStore,
    {
        match operation {
            Operation::Create { target, id, body } => {
                self.store.create_item(target, body, id, cancel).await
            }
            Operation::Replace { target, id, body } => {
                self.store.replace_item(target, id, body, cancel).await
            }
            Operation::Delete { target, id } => self.store.delete_item(target, id, cancel).await,
        }
    }

    // Builds the store call for a root entry; `None` when there is nothing
    // to write.
    fn prepare(&self, tracker: &EntryTracker, write: Write) -> UpdateResult<Option<Operation>> {
        let entry = tracker.entry(write.entry)?;
        let projection = |source: ProjectionError| UpdateError::Projection {
            entry: entry.id(),
            kind: entry.kind().to_string(),
            source,
        };
        let target = self
            .projector
            .target_name(entry.kind())
            .map_err(projection)?
            .to_string();

        let operation = match write.state {
            EntryState::Added => {
                let body = match self.projector.current_body(entry) {
                    Some(existing) => self
                        .projector
                        .merge_body(tracker, existing, entry)
                        .map_err(projection)?
                        .unwrap_or_else(|| existing.clone()),
                    None => self.projector.build_body(tracker, entry).map_err(projection)?,
                };
                let id = self.projector.identity(entry).map_err(projection)?;
                Operation::Create { target, id, body }
            }
            EntryState::Modified => {
                let body = match self.projector.current_body(entry) {
                    Some(existing) => {
                        match self
                            .projector
                            .merge_body(tracker, existing, entry)
                            .map_err(projection)?
                        {
                            Some(body) => body,
                            None => {
                                debug!("No changes to write for {} entry {}", entry.kind(), entry.id());
                                return Ok(None);
                            }
                        }
                    }
                    None => self.projector.build_body(tracker, entry).map_err(projection)?,
                };
                let source = tracker.shared_counterpart(entry.id()).unwrap_or(entry);
                let id = self.projector.identity(source).map_err(projection)?;
                Operation::Replace { target, id, body }
            }
            EntryState::Deleted => {
                let id = self.projector.identity(entry).map_err(projection)?;
                Operation::Delete { target, id }
            }
            EntryState::Unchanged | EntryState::Detached => return Ok(None),
        };
        Ok(Some(operation))
    }

    fn complete(
        &self,
        tracker: &mut EntryTracker,
        plan: &mut SaveBatch,
        write: Write,
        operation: Operation,
        result: StorageResult<bool>,
    ) -> UpdateResult<()> {
        match result {
            Ok(true) => {
                plan.record_success();
                if self.projector.options().sensitive_data_logging {
                    debug!("{} {} applied: {:?}", operation.name(), operation.id(), operation);
                } else {
                    debug!("{} {} applied", operation.name(), operation.id());
                }
                let document = match operation {
                    Operation::Create { body, .. } | Operation::Replace { body, .. } => Some(body),
                    Operation::Delete { .. } => None,
                };
                tracker.set_document(write.entry, document)?;
                Ok(())
            }
            Ok(false) => {
                debug!("{} {} not applied by the store", operation.name(), operation.id());
                Ok(())
            }
            Err(StorageError::Cancelled) => Err(UpdateError::Cancelled {
                affected: plan.affected(),
            }),
            Err(source) => {
                let entry = tracker.entry(write.entry)?;
                let error = wrap_store_error(entry, &operation, source);
                if error.is_concurrency_conflict()
                    && self.listener.on_conflict(&error) == ConflictResolution::Suppress
                {
                    warn!("Suppressed concurrency conflict: {}", error);
                    return Ok(());
                }
                Err(error)
            }
        }
    }
}

fn wrap_store_error(entry: &TrackedEntry, operation: &Operation, source: StorageError) -> UpdateError {
    // A replace or delete that finds no document lost a race with another writer.
    let vanished = matches!(source, StorageError::NotFound { .. })
        && !matches!(operation, Operation::Create { .. });
    let concurrency = source.is_precondition_failure() || vanished;
    let (entry, kind, id) = (entry.id(), entry.kind().to_string(), operation.id().to_string());
    if concurrency {
        UpdateError::Concurrency {
            entry,
            kind,
            id,
            source,
        }
    } else {
        UpdateError::Store {
            entry,
            kind,
            id,
            source,
        }
    }
}
