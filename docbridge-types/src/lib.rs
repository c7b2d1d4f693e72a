//! Core type definitions for docbridge.
//!
//! This crate defines the small, store-agnostic types shared by every layer
//! of the provider:
//! - Tracked entry identifiers (UUID v7)
//! - Entry states as reported by the host change tracker
//! - The serialized document body handed to the store
//!
//! Entity metadata lives in `docbridge-model`; tracking state lives in
//! `docbridge-tracking`.

mod ids;
mod state;

pub use ids::EntryId;
pub use state::EntryState;

/// A serialized document body: the top-level JSON object written to the store.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid entry state: {0}")]
    InvalidState(String),
}
