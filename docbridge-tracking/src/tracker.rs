use crate::entry::TrackedEntry;
use crate::error::{TrackingError, TrackingResult};
use docbridge_model::{Model, Property};
use docbridge_types::{Document, EntryId, EntryState};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Tracks entity instances and their pending changes.
///
/// Entries are kept in the order they were added; that order is the batch
/// order handed to the save pipeline.
#[derive(Debug)]
pub struct EntryTracker {
    model: Arc<Model>,
    entries: HashMap<EntryId, TrackedEntry>,
    order: Vec<EntryId>,
}

impl EntryTracker {
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Starts tracking a new entity that does not exist in the store yet.
    ///
    /// Every supplied property counts as modified.
    pub fn add(&mut self, kind: &str, values: Document) -> TrackingResult<EntryId> {
        self.check_properties(kind, &values)?;
        let mut entry = TrackedEntry::new(kind, EntryState::Added, values);
        entry.modified = entry.current.keys().cloned().collect();
        Ok(self.insert(entry))
    }

    /// Starts tracking an entity as it exists in the store.
    pub fn attach(&mut self, kind: &str, values: Document) -> TrackingResult<EntryId> {
        self.check_properties(kind, &values)?;
        let mut entry = TrackedEntry::new(kind, EntryState::Unchanged, values);
        entry.original = snapshot_values(&self.model, &entry)?;
        Ok(self.insert(entry))
    }

    /// Attaches an entity together with the body the store currently holds.
    pub fn attach_with_document(
        &mut self,
        kind: &str,
        values: Document,
        document: Document,
    ) -> TrackingResult<EntryId> {
        let id = self.attach(kind, values)?;
        self.set_document(id, Some(document))?;
        Ok(id)
    }

    fn insert(&mut self, entry: TrackedEntry) -> EntryId {
        let id = entry.id;
        debug!("Tracking {} entry {} as {}", entry.kind, id, entry.state);
        self.order.push(id);
        self.entries.insert(id, entry);
        id
    }

    fn check_properties(&self, kind: &str, values: &Document) -> TrackingResult<()> {
        for name in values.keys() {
            property_of(&self.model, kind, name)?;
        }
        Ok(())
    }

    pub fn get(&self, id: EntryId) -> Option<&TrackedEntry> {
        self.entries.get(&id)
    }

    /// Like [`get`](Self::get), but an untracked id is an error.
    pub fn entry(&self, id: EntryId) -> TrackingResult<&TrackedEntry> {
        self.entries.get(&id).ok_or(TrackingError::UnknownEntry(id))
    }

    fn entry_mut(&mut self, id: EntryId) -> TrackingResult<&mut TrackedEntry> {
        self.entries
            .get_mut(&id)
            .ok_or(TrackingError::UnknownEntry(id))
    }

    /// All tracked entries in tracking order.
    pub fn entries(&self) -> impl Iterator<Item = &TrackedEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Ids of the entries that need a store operation, in tracking order.
    pub fn pending(&self) -> Vec<EntryId> {
        self.entries()
            .filter(|e| e.state.has_pending_changes())
            .map(|e| e.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Links a nested entry to the entry that owns it.
    pub fn set_principal(&mut self, id: EntryId, principal: EntryId) -> TrackingResult<()> {
        self.entry(principal)?;
        self.entry_mut(id)?.principal = Some(principal);
        Ok(())
    }

    /// The owning entry of a nested entry, if it is tracked.
    pub fn principal_of(&self, id: EntryId) -> Option<&TrackedEntry> {
        self.get(id)
            .and_then(|e| e.principal)
            .and_then(|p| self.get(p))
    }

    /// Declares that two entries map to the same physical document.
    pub fn set_shared_identity(&mut self, id: EntryId, other: EntryId) -> TrackingResult<()> {
        self.entry(other)?;
        self.entry_mut(id)?.shared_identity = Some(other);
        Ok(())
    }

    /// The entry sharing a document with `id`, whichever side declared it.
    pub fn shared_counterpart(&self, id: EntryId) -> Option<&TrackedEntry> {
        let entry = self.get(id)?;
        if let Some(other) = entry.shared_identity.and_then(|o| self.get(o)) {
            return Some(other);
        }
        self.entries()
            .find(|e| e.id != id && e.shared_identity == Some(id))
    }

    /// Tracked entries owned by `principal` whose kind is, or derives from, `kind`.
    pub fn children_of(&self, principal: EntryId, kind: &str) -> Vec<&TrackedEntry> {
        self.entries()
            .filter(|e| e.principal == Some(principal))
            .filter(|e| self.model.is_assignable_to(&e.kind, kind))
            .collect()
    }

    /// Sets a property value and re-evaluates whether it changed.
    pub fn set_value(
        &mut self,
        id: EntryId,
        property: &str,
        value: Value,
    ) -> TrackingResult<()> {
        let model = Arc::clone(&self.model);
        let entry = self.entry_mut(id)?;
        let prop = property_of(&model, &entry.kind, property)?;
        entry.current.insert(property.to_string(), value);
        detect_property(entry, prop)?;
        Ok(())
    }

    /// Mutable access to a property value.
    ///
    /// In-place edits are picked up by the next
    /// [`detect_changes`](Self::detect_changes).
    pub fn value_mut(&mut self, id: EntryId, property: &str) -> TrackingResult<&mut Value> {
        let model = Arc::clone(&self.model);
        let entry = self.entry_mut(id)?;
        property_of(&model, &entry.kind, property)?;
        Ok(entry
            .current
            .entry(property.to_string())
            .or_insert(Value::Null))
    }

    /// Compares every tracked value against its snapshot.
    ///
    /// Unchanged entries with differing values become Modified. Returns the
    /// number of entries that changed state.
    pub fn detect_changes(&mut self) -> TrackingResult<usize> {
        let mut promoted = 0;
        for id in &self.order {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            if !matches!(entry.state, EntryState::Unchanged | EntryState::Modified) {
                continue;
            }
            let before = entry.state;
            for property in self.model.properties(&entry.kind)? {
                detect_property(entry, property)?;
            }
            if before != entry.state {
                promoted += 1;
            }
        }
        debug!("Change detection promoted {} entries", promoted);
        Ok(promoted)
    }

    /// Marks an entry for deletion.
    ///
    /// An Added entry was never written, so it simply stops being tracked.
    pub fn delete(&mut self, id: EntryId) -> TrackingResult<()> {
        let entry = self.entry_mut(id)?;
        if entry.state == EntryState::Added {
            self.detach(id);
        } else {
            entry.state = EntryState::Deleted;
        }
        Ok(())
    }

    /// Overrides an entry's state. Used when a root is promoted for saving.
    pub fn set_state(&mut self, id: EntryId, state: EntryState) -> TrackingResult<()> {
        let entry = self.entry_mut(id)?;
        if entry.state != state {
            debug!("Entry {} {} -> {}", id, entry.state, state);
        }
        entry.state = state;
        Ok(())
    }

    /// Records (or clears) the body last written for an entry.
    pub fn set_document(&mut self, id: EntryId, document: Option<Document>) -> TrackingResult<()> {
        self.entry_mut(id)?.document = document;
        Ok(())
    }

    /// Stops tracking an entry.
    pub fn detach(&mut self, id: EntryId) -> Option<TrackedEntry> {
        let mut entry = self.entries.remove(&id)?;
        self.order.retain(|e| *e != id);
        entry.state = EntryState::Detached;
        Some(entry)
    }

    /// Makes the current values the new baseline for one entry.
    ///
    /// Deleted entries are detached.
    pub fn accept_changes(&mut self, id: EntryId) -> TrackingResult<()> {
        let model = Arc::clone(&self.model);
        let entry = self.entry_mut(id)?;
        if entry.state == EntryState::Deleted {
            self.detach(id);
            return Ok(());
        }
        entry.original = snapshot_values(&model, entry)?;
        entry.modified.clear();
        entry.state = EntryState::Unchanged;
        Ok(())
    }

    /// Accepts the changes of every tracked entry.
    pub fn accept_all_changes(&mut self) -> TrackingResult<()> {
        for id in self.order.clone() {
            self.accept_changes(id)?;
        }
        Ok(())
    }
}

fn property_of<'m>(model: &'m Model, kind: &str, name: &str) -> TrackingResult<&'m Property> {
    model
        .property(kind, name)?
        .ok_or_else(|| TrackingError::UnknownProperty {
            kind: kind.to_string(),
            property: name.to_string(),
        })
}

fn snapshot_values(model: &Model, entry: &TrackedEntry) -> TrackingResult<Document> {
    let mut original = Document::new();
    for (name, value) in &entry.current {
        let property = property_of(model, &entry.kind, name)?;
        original.insert(name.clone(), property.comparer.snapshot(value)?);
    }
    Ok(original)
}

// Added entries keep every supplied property flagged; only entries with a
// snapshot are compared.
fn detect_property(entry: &mut TrackedEntry, property: &Property) -> TrackingResult<()> {
    let name = property.name.as_str();
    if entry.state == EntryState::Added {
        entry.modified.insert(name.to_string());
        return Ok(());
    }
    if !matches!(entry.state, EntryState::Unchanged | EntryState::Modified) {
        return Ok(());
    }

    let current = entry.current.get(name).unwrap_or(&Value::Null);
    let original = entry.original.get(name).unwrap_or(&Value::Null);
    if property.comparer.equals(current, original)? {
        entry.modified.remove(name);
    } else {
        entry.modified.insert(name.to_string());
        if entry.state == EntryState::Unchanged {
            entry.state = EntryState::Modified;
        }
    }
    Ok(())
}
