//! An in-memory document store.
//!
//! Keeps documents per target, records every write it is asked to perform
//! and can be scripted to fail the next operation on a given id. Used by
//! tests and by hosts that want a throwaway store.

use crate::error::{StorageError, StorageResult};
use crate::store::{AsyncDocumentStore, DocumentStore};
use async_trait::async_trait;
use docbridge_types::Document;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A write operation as received by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
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

impl StoreOperation {
    pub fn target(&self) -> &str {
        match self {
            Self::Create { target, .. } | Self::Replace { target, .. } | Self::Delete { target, .. } => {
                target
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Create { id, .. } | Self::Replace { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    /// Short operation name: `create`, `replace` or `delete`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Replace { .. } => "replace",
            Self::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, HashMap<String, Document>>,
    operations: Vec<StoreOperation>,
    failures: HashMap<String, StorageError>,
}

/// Document store backed by a map of `target → id → document`.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: Mutex<Inner>,
    latency: Option<Duration>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every async operation; cancellation interrupts the delay.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds a document without recording an operation.
    pub fn insert(&self, target: &str, id: &str, body: Document) {
        self.lock()
            .documents
            .entry(target.to_string())
            .or_default()
            .insert(id.to_string(), body);
    }

    /// Returns a copy of a stored document.
    pub fn item(&self, target: &str, id: &str) -> Option<Document> {
        self.lock()
            .documents
            .get(target)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in a target.
    pub fn count(&self, target: &str) -> usize {
        self.lock().documents.get(target).map_or(0, HashMap::len)
    }

    /// Every write received so far, in order, including failed ones.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.lock().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Makes the next operation on `id` fail with `error`.
    pub fn fail_next(&self, id: &str, error: StorageError) {
        self.lock().failures.insert(id.to_string(), error);
    }

    fn record(&self, operation: StoreOperation) -> StorageResult<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        let id = operation.id().to_string();
        debug!("{} {} in {}", operation.kind(), id, operation.target());
        inner.operations.push(operation);
        let failure = inner.failures.remove(&id);
        match failure {
            Some(error) => Err(error),
            None => Ok(inner),
        }
    }

    async fn pause(&self, cancel: &CancellationToken) -> StorageResult<()> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if let Some(latency) = self.latency {
            tokio::select! {
                _ = cancel.cancelled() => return Err(StorageError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }
        Ok(())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn create_item(&self, target: &str, body: &Document, id: &str) -> StorageResult<bool> {
        let mut inner = self.record(StoreOperation::Create {
            target: target.to_string(),
            id: id.to_string(),
            body: body.clone(),
        })?;
        let docs = inner.documents.entry(target.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StorageError::Conflict {
                target: target.to_string(),
                id: id.to_string(),
            });
        }
        docs.insert(id.to_string(), body.clone());
        Ok(true)
    }

    fn replace_item(&self, target: &str, id: &str, body: &Document) -> StorageResult<bool> {
        let mut inner = self.record(StoreOperation::Replace {
            target: target.to_string(),
            id: id.to_string(),
            body: body.clone(),
        })?;
        match inner.documents.get_mut(target).and_then(|docs| docs.get_mut(id)) {
            Some(existing) => {
                *existing = body.clone();
                Ok(true)
            }
            None => Err(StorageError::NotFound {
                target: target.to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn delete_item(&self, target: &str, id: &str) -> StorageResult<bool> {
        let mut inner = self.record(StoreOperation::Delete {
            target: target.to_string(),
            id: id.to_string(),
        })?;
        match inner.documents.get_mut(target).and_then(|docs| docs.remove(id)) {
            Some(_) => Ok(true),
            None => Err(StorageError::NotFound {
                target: target.to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn read_item(&self, target: &str, id: &str) -> StorageResult<Option<Document>> {
        let mut inner = self.lock();
        if let Some(error) = inner.failures.remove(id) {
            return Err(error);
        }
        Ok(inner
            .documents
            .get(target)
            .and_then(|docs| docs.get(id))
            .cloned())
    }
}

#[async_trait]
impl AsyncDocumentStore for InMemoryDocumentStore {
    async fn create_item(
        &self,
        target: &str,
        body: &Document,
        id: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        self.pause(cancel).await?;
        DocumentStore::create_item(self, target, body, id)
    }

    async fn replace_item(
        &self,
        target: &str,
        id: &str,
        body: &Document,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        self.pause(cancel).await?;
        DocumentStore::replace_item(self, target, id, body)
    }

    async fn delete_item(
        &self,
        target: &str,
        id: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        self.pause(cancel).await?;
        DocumentStore::delete_item(self, target, id)
    }

    async fn read_item(
        &self,
        target: &str,
        id: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Document>> {
        self.pause(cancel).await?;
        DocumentStore::read_item(self, target, id)
    }
}
