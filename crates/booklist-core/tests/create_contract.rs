//! Sync Contract Test: Create
//!
//! Constraints verified:
//! - An empty name or author never reaches the store and changes nothing
//! - A stored book is shown at index 0
//! - Form buffers are empty after every create that reached the store
//! - Concurrent creates are not serialized; arrival order decides the list

mod common;

use std::sync::Arc;
use std::time::Duration;

use booklist_core::{CreateOutcome, SyncEvent};
use common::*;

#[tokio::test]
async fn empty_fields_never_reach_the_store() {
    let store = ScriptedStore::new();
    let existing = store.seed("Dune", "Herbert").await;

    let (layer, mut events) = sync_layer(&store);
    layer.fetch_all().await;
    drain(&mut events);

    for (name, author) in [("", ""), ("Emma", ""), ("", "Austen")] {
        layer.form().name.set(name.to_string());
        layer.form().author.set(author.to_string());

        assert_eq!(layer.create(name, author).await, CreateOutcome::Skipped);
        assert_eq!(layer.books().get(), vec![existing.clone()]);

        // The no-op returns before the form is cleared
        assert_eq!(layer.form().name.get(), name);
        assert_eq!(layer.form().author.get(), author);
    }

    assert_eq!(store.insert_count(), 0);
    assert_eq!(drain(&mut events), vec![SyncEvent::CreateSkipped; 3]);
}

#[tokio::test]
async fn created_book_is_first_and_form_is_cleared() {
    let store = ScriptedStore::new();
    store.seed("Emma", "Austen").await;

    let (layer, _events) = sync_layer(&store);
    layer.fetch_all().await;

    layer.form().name.set("Dune".into());
    layer.form().author.set("Herbert".into());

    let created = match layer.create("Dune", "Herbert").await {
        CreateOutcome::Created(book) => book,
        other => panic!("expected Created, got {:?}", other),
    };

    let shown = layer.books().get();
    assert_eq!(shown[0], created);
    assert!(!created.id.is_empty(), "id comes from the store");
    assert!(created.created_at.is_some(), "timestamp comes from the store");
    assert_eq!(shown, store.rows().await, "prepend preserves newest-first order");

    assert_eq!(layer.form().name.get(), "");
    assert_eq!(layer.form().author.get(), "");
    assert_eq!(store.select_count(), 1, "create does not refetch");
}

#[tokio::test]
async fn failed_create_still_clears_form() {
    let store = ScriptedStore::new();
    let (layer, mut events) = sync_layer(&store);

    layer.form().name.set("Dune".into());
    layer.form().author.set("Herbert".into());
    store.fail_next_insert(1);

    assert_eq!(layer.create("Dune", "Herbert").await, CreateOutcome::Failed);
    assert!(layer.books().is_empty());
    assert_eq!(layer.form().name.get(), "");
    assert_eq!(layer.form().author.get(), "");
    assert_eq!(store.insert_count(), 1);
    assert!(matches!(
        drain(&mut events).as_slice(),
        [SyncEvent::CreateFailed { .. }]
    ));
}

#[tokio::test]
async fn concurrent_creates_follow_response_order() {
    let store = ScriptedStore::new();
    // The first insert answers last
    store.delay_inserts(vec![Duration::from_millis(100), Duration::ZERO]);

    let (layer, _events) = sync_layer(&store);
    let layer = Arc::new(layer);

    let slow = {
        let layer = Arc::clone(&layer);
        tokio::spawn(async move { layer.create("Slow", "First").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let fast = {
        let layer = Arc::clone(&layer);
        tokio::spawn(async move { layer.create("Fast", "Second").await })
    };

    assert!(matches!(fast.await.unwrap(), CreateOutcome::Created(_)));
    assert!(matches!(slow.await.unwrap(), CreateOutcome::Created(_)));

    let shown: Vec<_> = layer.books().get().into_iter().map(|b| b.name).collect();
    assert_eq!(shown, ["Slow", "Fast"], "last response to arrive is on top");

    let stored: Vec<_> = store.rows().await.into_iter().map(|b| b.name).collect();
    assert_eq!(stored, ["Fast", "Slow"], "store orders by issue time");
}
