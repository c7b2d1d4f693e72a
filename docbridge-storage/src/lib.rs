//! Document store access for docbridge.
//!
//! The save pipeline talks to the store only through [`DocumentStore`] (or
//! its cancellation-aware twin [`AsyncDocumentStore`]). The wire protocol,
//! connection handling and container provisioning belong to the
//! implementations.

mod error;
pub mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use memory::{InMemoryDocumentStore, StoreOperation};
pub use store::{AsyncDocumentStore, DocumentStore};
