//! Per-batch save state shared by the blocking and async pipelines.

use crate::error::{UpdateError, UpdateResult};
use crate::projector::DocumentProjector;
use docbridge_tracking::{EntryTracker, TrackedEntry};
use docbridge_types::{EntryId, EntryState};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// A root entry ready to be written, with the state it is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Write {
    pub(crate) entry: EntryId,
    pub(crate) state: EntryState,
}

/// Work queue and bookkeeping for one batch.
///
/// Nested entries are resolved to their root entry up front; orphans fail
/// the batch before anything is written. Each root is written at most once.
#[derive(Debug)]
pub(crate) struct SaveBatch {
    queue: VecDeque<EntryId>,
    roots: HashMap<EntryId, EntryId>,
    suppressed: HashSet<EntryId>,
    as_modified: HashSet<EntryId>,
    saved: HashSet<EntryId>,
    roots_to_save: HashSet<EntryId>,
    // Insertion order of `roots_to_save`, drained after the queue.
    promoted: VecDeque<EntryId>,
    affected: usize,
}

impl SaveBatch {
    pub(crate) fn plan(
        tracker: &EntryTracker,
        projector: &DocumentProjector,
        batch: &[EntryId],
    ) -> UpdateResult<Self> {
        let model = projector.model();
        let mut roots = HashMap::new();
        let mut suppressed = HashSet::new();
        let mut as_modified = HashSet::new();

        for &id in batch {
            let entry = tracker.entry(id)?;
            if !model.is_document_root(entry.kind())? {
                let root = resolve_root(tracker, projector, entry)?;
                roots.insert(id, root);
                continue;
            }

            if entry.state() != EntryState::Added {
                continue;
            }
            if let Some(counterpart) = tracker.shared_counterpart(id) {
                if counterpart.state() == EntryState::Deleted {
                    debug!(
                        "Skipping added {} entry {}: shared document is deleted by {}",
                        entry.kind(),
                        id,
                        counterpart.id()
                    );
                    suppressed.insert(id);
                } else {
                    as_modified.insert(id);
                }
            }
        }

        Ok(Self {
            queue: batch.iter().copied().collect(),
            roots,
            suppressed,
            as_modified,
            saved: HashSet::new(),
            roots_to_save: HashSet::new(),
            promoted: VecDeque::new(),
            affected: 0,
        })
    }

    /// Advances to the next root that needs a store call.
    ///
    /// Nested entries are folded into their root here: an Unchanged root is
    /// promoted to Modified and queued. Once the queue is empty, roots that
    /// were marked for saving but never written are returned.
    pub(crate) fn next_write(&mut self, tracker: &mut EntryTracker) -> UpdateResult<Option<Write>> {
        while let Some(id) = self.queue.pop_front() {
            if tracker.get(id).is_none() {
                continue;
            }

            if let Some(&root) = self.roots.get(&id) {
                self.mark_root(tracker, root)?;
                continue;
            }

            if !self.saved.insert(id) {
                continue;
            }
            if let Some(write) = self.write_for(tracker, id) {
                return Ok(Some(write));
            }
        }

        while let Some(root) = self.promoted.pop_front() {
            if !self.saved.insert(root) {
                continue;
            }
            if let Some(write) = self.write_for(tracker, root) {
                return Ok(Some(write));
            }
        }
        Ok(None)
    }

    pub(crate) fn record_success(&mut self) {
        self.affected += 1;
    }

    pub(crate) fn affected(&self) -> usize {
        self.affected
    }

    fn mark_root(&mut self, tracker: &mut EntryTracker, root: EntryId) -> UpdateResult<()> {
        if self.saved.contains(&root) || !self.roots_to_save.insert(root) {
            return Ok(());
        }
        self.promoted.push_back(root);
        if tracker.entry(root)?.state() == EntryState::Unchanged {
            debug!("Promoting root entry {} to modified for nested changes", root);
            tracker.set_state(root, EntryState::Modified)?;
            self.queue.push_back(root);
        }
        Ok(())
    }

    fn write_for(&self, tracker: &EntryTracker, id: EntryId) -> Option<Write> {
        let entry = tracker.get(id)?;
        if self.suppressed.contains(&id) {
            return None;
        }
        let state = if self.as_modified.contains(&id) {
            EntryState::Modified
        } else {
            entry.state()
        };
        state
            .has_pending_changes()
            .then_some(Write { entry: id, state })
    }
}

// Walks principal links up to the owning document root.
fn resolve_root(
    tracker: &EntryTracker,
    projector: &DocumentProjector,
    entry: &TrackedEntry,
) -> UpdateResult<EntryId> {
    let model = projector.model();
    let mut current = entry;
    for _ in 0..=model.max_ownership_depth() {
        let Some(principal) = tracker.principal_of(current.id()) else {
            break;
        };
        if model.is_document_root(principal.kind())? {
            return Ok(principal.id());
        }
        current = principal;
    }

    let owner = model
        .ownership(current.kind())?
        .map(|o| o.principal.clone())
        .unwrap_or_default();
    let key_values = projector
        .options()
        .sensitive_data_logging
        .then(|| projector.describe_keys(current));
    Err(UpdateError::OrphanedDocument {
        kind: current.kind().to_string(),
        owner,
        key_values,
    })
}
