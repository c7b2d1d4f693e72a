use docbridge_types::{Document, EntryId, EntryState};
use serde_json::Value;
use std::collections::BTreeSet;

/// One tracked entity instance.
///
/// The entry refers to its kind by name; kind metadata lives in the shared
/// model. Property values are kept as JSON, keyed by property name (not the
/// JSON name used in documents).
#[derive(Debug, Clone)]
pub struct TrackedEntry {
    pub(crate) id: EntryId,
    pub(crate) kind: String,
    pub(crate) state: EntryState,
    pub(crate) shared_identity: Option<EntryId>,
    pub(crate) principal: Option<EntryId>,
    pub(crate) current: Document,
    pub(crate) original: Document,
    pub(crate) modified: BTreeSet<String>,
    pub(crate) document: Option<Document>,
}

impl TrackedEntry {
    pub(crate) fn new(kind: &str, state: EntryState, current: Document) -> Self {
        Self {
            id: EntryId::new(),
            kind: kind.to_string(),
            state,
            shared_identity: None,
            principal: None,
            current,
            original: Document::new(),
            modified: BTreeSet::new(),
            document: None,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Another entry mapped to the same physical document, if this entry
    /// declared one.
    pub fn shared_identity(&self) -> Option<EntryId> {
        self.shared_identity
    }

    /// The owning entry of a nested entry.
    pub fn principal(&self) -> Option<EntryId> {
        self.principal
    }

    /// Current value of a property. Unset properties read as `None`.
    pub fn value(&self, property: &str) -> Option<&Value> {
        self.current.get(property)
    }

    pub fn values(&self) -> &Document {
        &self.current
    }

    /// Snapshot taken when the entry was attached or last accepted.
    pub fn original_value(&self, property: &str) -> Option<&Value> {
        self.original.get(property)
    }

    pub fn is_modified(&self, property: &str) -> bool {
        self.modified.contains(property)
    }

    /// Names of the properties flagged as changed, in name order.
    pub fn modified_properties(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    /// Body last written to the store for this entry, if any.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }
}
