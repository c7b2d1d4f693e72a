//! Store client abstraction.

use crate::error::StorageResult;
use async_trait::async_trait;
use docbridge_types::Document;
use tokio_util::sync::CancellationToken;

/// A blocking document store client.
///
/// Write operations return `Ok(true)` when the store applied them.
pub trait DocumentStore: Send + Sync {
    /// Creates a document. Fails if `id` already exists in `target`.
    fn create_item(&self, target: &str, body: &Document, id: &str) -> StorageResult<bool>;

    /// Replaces an existing document.
    fn replace_item(&self, target: &str, id: &str, body: &Document) -> StorageResult<bool>;

    /// Deletes an existing document.
    fn delete_item(&self, target: &str, id: &str) -> StorageResult<bool>;

    /// Reads a document, `None` if it does not exist.
    fn read_item(&self, target: &str, id: &str) -> StorageResult<Option<Document>>;
}

/// An async document store client.
///
/// Implementations should return [`StorageError::Cancelled`] promptly once
/// `cancel` fires.
///
/// [`StorageError::Cancelled`]: crate::StorageError::Cancelled
#[async_trait]
pub trait AsyncDocumentStore: Send + Sync {
    async fn create_item(
        &self,
        target: &str,
        body: &Document,
        id: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<bool>;

    async fn replace_item(
        &self,
        target: &str,
        id: &str,
        body: &Document,
        cancel: &CancellationToken,
    ) -> StorageResult<bool>;

    async fn delete_item(
        &self,
        target: &str,
        id: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<bool>;

    async fn read_item(
        &self,
        target: &str,
        id: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Document>>;
}
