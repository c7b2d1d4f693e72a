use docbridge_storage::{
    AsyncDocumentStore, DocumentStore, InMemoryDocumentStore, StorageError, StoreOperation,
};
use docbridge_types::Document;
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

// ── Blocking client ──────────────────────────────────────────────

#[test]
fn create_then_read() {
    let store = InMemoryDocumentStore::new();
    let body = doc(json!({"id": "1", "title": "a"}));

    assert!(DocumentStore::create_item(&store, "blogs", &body, "1").unwrap());
    assert_eq!(
        DocumentStore::read_item(&store, "blogs", "1").unwrap(),
        Some(body)
    );
    assert_eq!(store.count("blogs"), 1);
}

#[test]
fn create_existing_conflicts() {
    let store = InMemoryDocumentStore::new();
    store.insert("blogs", "1", doc(json!({"id": "1"})));

    let err = DocumentStore::create_item(&store, "blogs", &doc(json!({"id": "1"})), "1")
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict { .. }));
}

#[test]
fn replace_and_delete_missing_are_not_found() {
    let store = InMemoryDocumentStore::new();
    let body = doc(json!({"id": "1"}));

    assert!(matches!(
        DocumentStore::replace_item(&store, "blogs", "1", &body),
        Err(StorageError::NotFound { .. })
    ));
    assert!(matches!(
        DocumentStore::delete_item(&store, "blogs", "1"),
        Err(StorageError::NotFound { .. })
    ));
}

#[test]
fn replace_overwrites_body() {
    let store = InMemoryDocumentStore::new();
    store.insert("blogs", "1", doc(json!({"id": "1", "title": "a"})));

    let updated = doc(json!({"id": "1", "title": "b"}));
    assert!(DocumentStore::replace_item(&store, "blogs", "1", &updated).unwrap());
    assert_eq!(store.item("blogs", "1"), Some(updated));
}

#[test]
fn operations_are_recorded_in_order() {
    let store = InMemoryDocumentStore::new();
    let body = doc(json!({"id": "1"}));
    DocumentStore::create_item(&store, "blogs", &body, "1").unwrap();
    DocumentStore::delete_item(&store, "blogs", "1").unwrap();

    assert_eq!(
        store.operations(),
        vec![
            StoreOperation::Create {
                target: "blogs".into(),
                id: "1".into(),
                body,
            },
            StoreOperation::Delete {
                target: "blogs".into(),
                id: "1".into(),
            },
        ]
    );
    store.clear_operations();
    assert!(store.operations().is_empty());
}

#[test]
fn scripted_failure_fires_once() {
    let store = InMemoryDocumentStore::new();
    store.insert("blogs", "1", doc(json!({"id": "1"})));
    store.fail_next(
        "1",
        StorageError::PreconditionFailed {
            target: "blogs".into(),
            id: "1".into(),
        },
    );

    let body = doc(json!({"id": "1", "title": "b"}));
    let err = DocumentStore::replace_item(&store, "blogs", "1", &body).unwrap_err();
    assert!(err.is_precondition_failure());
    // The failed attempt is still recorded, and the document is untouched.
    assert_eq!(store.operations().len(), 1);
    assert_eq!(store.item("blogs", "1"), Some(doc(json!({"id": "1"}))));

    assert!(DocumentStore::replace_item(&store, "blogs", "1", &body).unwrap());
}

// ── Async client ─────────────────────────────────────────────────

#[tokio::test]
async fn async_create_and_delete() {
    let store = InMemoryDocumentStore::new();
    let cancel = CancellationToken::new();
    let body = doc(json!({"id": "1"}));

    assert!(
        AsyncDocumentStore::create_item(&store, "blogs", &body, "1", &cancel)
            .await
            .unwrap()
    );
    assert!(
        AsyncDocumentStore::delete_item(&store, "blogs", "1", &cancel)
            .await
            .unwrap()
    );
    assert_eq!(
        AsyncDocumentStore::read_item(&store, "blogs", "1", &cancel)
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn cancelled_token_short_circuits() {
    let store = InMemoryDocumentStore::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = AsyncDocumentStore::create_item(&store, "blogs", &doc(json!({})), "1", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));
    assert!(store.operations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_latency() {
    let store = Arc::new(InMemoryDocumentStore::new().with_latency(Duration::from_secs(30)));
    let cancel = CancellationToken::new();

    let task = {
        let store = Arc::clone(&store);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            AsyncDocumentStore::delete_item(store.as_ref(), "blogs", "1", &cancel).await
        })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(StorageError::Cancelled)));
    assert!(store.operations().is_empty());
}
