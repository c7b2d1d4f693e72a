use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The state of a tracked entry as seen by the save pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Not tracked any more; ignored by every save.
    Detached,
    /// Tracked and identical to what the store holds.
    Unchanged,
    /// New; the document does not exist in the store yet.
    Added,
    /// Exists in the store and has pending changes.
    Modified,
    /// Exists in the store and must be removed.
    Deleted,
}

impl EntryState {
    /// Whether an entry in this state needs a store operation.
    pub fn has_pending_changes(self) -> bool {
        matches!(self, Self::Added | Self::Modified | Self::Deleted)
    }

    /// Returns the state name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryState {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detached" => Ok(Self::Detached),
            "unchanged" => Ok(Self::Unchanged),
            "added" => Ok(Self::Added),
            "modified" => Ok(Self::Modified),
            "deleted" => Ok(Self::Deleted),
            other => Err(crate::Error::InvalidState(other.to_string())),
        }
    }
}
