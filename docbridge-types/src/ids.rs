//! Identifier types used throughout docbridge.

use std::fmt;
use uuid::Uuid;

/// Identifies one tracked entry inside an `EntryTracker`.
///
/// UUID v7, so ids issued by one tracker sort in creation order. The id is
/// only meaningful for the lifetime of that tracker; it is never written to
/// the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
