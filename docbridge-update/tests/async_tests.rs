use async_trait::async_trait;
use docbridge_model::{EntityKind, Model};
use docbridge_storage::{
    AsyncDocumentStore, InMemoryDocumentStore, StorageError, StorageResult, StoreOperation,
};
use docbridge_tracking::EntryTracker;
use docbridge_types::Document;
use docbridge_update::{ChangeSetProcessor, SaveOptions, SuppressConflicts, UpdateError};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

fn model() -> Arc<Model> {
    Arc::new(
        Model::builder()
            .kind(
                EntityKind::root("Blog")
                    .with_target("blogs")
                    .with_key("id")
                    .with_field("title"),
            )
            .kind(
                EntityKind::owned("Post", "Blog", "posts")
                    .collection()
                    .with_field("title"),
            )
            .build()
            .unwrap(),
    )
}

// ── Saving ───────────────────────────────────────────────────────

#[tokio::test]
async fn async_save_matches_blocking_pipeline() {
    let model = model();
    let store = Arc::new(InMemoryDocumentStore::new());
    store.insert("blogs", "1", doc(json!({"id": 1, "title": "a", "posts": []})));
    let processor = ChangeSetProcessor::new(Arc::clone(&store), Arc::clone(&model), SaveOptions::default());
    let mut tracker = EntryTracker::new(model);

    let blog = tracker
        .attach("Blog", doc(json!({"id": 1, "title": "a"})))
        .unwrap();
    let post = tracker.add("Post", doc(json!({"title": "hello"}))).unwrap();
    tracker.set_principal(post, blog).unwrap();
    let created = tracker
        .add("Blog", doc(json!({"id": 2, "title": "b"})))
        .unwrap();

    let affected = processor
        .save_changes_async(&mut tracker, &[post, created], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(affected, 2);
    let ops: Vec<_> = store
        .operations()
        .iter()
        .map(|op| (op.kind(), op.id().to_string()))
        .collect();
    // The promoted root is queued behind the rest of the batch.
    assert_eq!(ops, vec![("create", "2".to_string()), ("replace", "1".to_string())]);
    assert_eq!(
        store.item("blogs", "1").unwrap()["posts"],
        json!([{"title": "hello"}])
    );
}

#[tokio::test]
async fn async_conflict_can_be_suppressed() {
    let model = model();
    let store = Arc::new(InMemoryDocumentStore::new());
    let processor = ChangeSetProcessor::new(Arc::clone(&store), Arc::clone(&model), SaveOptions::default())
        .with_listener(Arc::new(SuppressConflicts));
    let mut tracker = EntryTracker::new(model);

    let missing = tracker.attach("Blog", doc(json!({"id": 1}))).unwrap();
    tracker.delete(missing).unwrap();
    let created = tracker.add("Blog", doc(json!({"id": 2}))).unwrap();

    let affected = processor
        .save_changes_async(&mut tracker, &[missing, created], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(store.count("blogs"), 1);
}

// ── Cancellation ─────────────────────────────────────────────────

#[tokio::test]
async fn cancelled_before_start_writes_nothing() {
    let model = model();
    let store = Arc::new(InMemoryDocumentStore::new());
    let processor = ChangeSetProcessor::new(Arc::clone(&store), Arc::clone(&model), SaveOptions::default());
    let mut tracker = EntryTracker::new(model);
    let blog = tracker.add("Blog", doc(json!({"id": 1}))).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = processor
        .save_changes_async(&mut tracker, &[blog], &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::Cancelled { affected: 0 }));
    assert!(store.operations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_in_flight_write() {
    let model = model();
    let store = Arc::new(InMemoryDocumentStore::new().with_latency(Duration::from_secs(10)));
    let processor = ChangeSetProcessor::new(Arc::clone(&store), Arc::clone(&model), SaveOptions::default());
    let mut tracker = EntryTracker::new(model);
    let first = tracker.add("Blog", doc(json!({"id": 1}))).unwrap();
    let second = tracker.add("Blog", doc(json!({"id": 2}))).unwrap();

    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            cancel.cancel();
        })
    };

    let err = processor
        .save_changes_async(&mut tracker, &[first, second], &cancel)
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, UpdateError::Cancelled { affected: 1 }));
    assert_eq!(store.operations().len(), 1);
    assert!(tracker.entry(first).unwrap().document().is_some());
    assert!(tracker.entry(second).unwrap().document().is_none());
}

/// A store that reports cancellation itself instead of hanging.
struct CancellingStore;

#[async_trait]
impl AsyncDocumentStore for CancellingStore {
    async fn create_item(
        &self,
        _target: &str,
        _body: &Document,
        _id: &str,
        _cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        Err(StorageError::Cancelled)
    }

    async fn replace_item(
        &self,
        _target: &str,
        _id: &str,
        _body: &Document,
        _cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        Err(StorageError::Cancelled)
    }

    async fn delete_item(
        &self,
        _target: &str,
        _id: &str,
        _cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        Err(StorageError::Cancelled)
    }

    async fn read_item(
        &self,
        _target: &str,
        _id: &str,
        _cancel: &CancellationToken,
    ) -> StorageResult<Option<Document>> {
        Ok(None)
    }
}

#[tokio::test]
async fn store_cancellation_is_not_wrapped() {
    let model = model();
    let processor = ChangeSetProcessor::new(Arc::new(CancellingStore), Arc::clone(&model), SaveOptions::default());
    let mut tracker = EntryTracker::new(model);
    let blog = tracker.add("Blog", doc(json!({"id": 1}))).unwrap();

    let err = processor
        .save_changes_async(&mut tracker, &[blog], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::Cancelled { affected: 0 }));
}

#[tokio::test]
async fn trait_object_store() {
    let model = model();
    let memory = Arc::new(InMemoryDocumentStore::new());
    let store: Arc<dyn AsyncDocumentStore> = memory.clone();
    let processor = ChangeSetProcessor::new(store, Arc::clone(&model), SaveOptions::default());
    let mut tracker = EntryTracker::new(model);
    let blog = tracker.add("Blog", doc(json!({"id": 1, "title": "a"}))).unwrap();

    processor
        .save_changes_async(&mut tracker, &[blog], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        memory.operations(),
        vec![StoreOperation::Create {
            target: "blogs".into(),
            id: "1".into(),
            body: doc(json!({"id": 1, "title": "a", "posts": []})),
        }]
    );
}
