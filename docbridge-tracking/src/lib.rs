//! Change tracking for docbridge.
//!
//! The [`EntryTracker`] is the state manager the save pipeline reads from:
//! it holds one [`TrackedEntry`] per entity instance, the original-value
//! snapshots used for change detection, the ownership links between nested
//! entries and their principals, and the serialized body last written for
//! each document root.

mod entry;
mod error;
mod tracker;

pub use entry::TrackedEntry;
pub use error::{TrackingError, TrackingResult};
pub use tracker::EntryTracker;
