//! Test doubles and common utilities for sync contract tests
//!
//! [`ScriptedStore`] wraps a real in-memory table store, counts every
//! call and can be told to fail or delay upcoming calls.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use booklist_core::error::{Error, Result};
use booklist_core::record::{Book, BookChanges, NewBook};
use booklist_core::traits::{Match, OrderBy, TableStore};
use booklist_core::{BookList, BooklistConfig, FormState, MemoryTableStore, SyncEvent, SyncLayer};
use tokio::sync::mpsc;

/// Table every contract test works on
pub const TABLE: &str = "books";

#[derive(Default)]
struct Counters {
    select: AtomicUsize,
    insert: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

#[derive(Default)]
struct Script {
    fail_select: usize,
    fail_insert: usize,
    fail_update: usize,
    fail_delete: usize,
    insert_delays: Vec<Duration>,
}

/// A TableStore backed by MemoryTableStore that tracks and scripts calls
///
/// Clones share the rows, the counters and the script.
#[derive(Clone)]
pub struct ScriptedStore {
    inner: MemoryTableStore,
    counters: Arc<Counters>,
    script: Arc<Mutex<Script>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::over(MemoryTableStore::new())
    }

    pub fn over(inner: MemoryTableStore) -> Self {
        Self {
            inner,
            counters: Arc::new(Counters::default()),
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// The rows as the store holds them, newest first
    pub async fn rows(&self) -> Vec<Book> {
        self.inner
            .select(TABLE, "*", &OrderBy::desc("created_at"))
            .await
            .unwrap()
    }

    /// Insert a row directly, bypassing the counters
    pub async fn seed(&self, name: &str, author: &str) -> Book {
        self.inner
            .insert(TABLE, &NewBook::new(name, author))
            .await
            .unwrap()
    }

    pub async fn get(&self, id: &str) -> Option<Book> {
        self.inner.get(TABLE, id).await
    }

    pub fn select_count(&self) -> usize {
        self.counters.select.load(Ordering::SeqCst)
    }

    pub fn insert_count(&self) -> usize {
        self.counters.insert.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.counters.update.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.counters.delete.load(Ordering::SeqCst)
    }

    pub fn fail_next_select(&self, n: usize) {
        self.script.lock().unwrap().fail_select = n;
    }

    pub fn fail_next_insert(&self, n: usize) {
        self.script.lock().unwrap().fail_insert = n;
    }

    pub fn fail_next_update(&self, n: usize) {
        self.script.lock().unwrap().fail_update = n;
    }

    pub fn fail_next_delete(&self, n: usize) {
        self.script.lock().unwrap().fail_delete = n;
    }

    /// Hold the responses of the next inserts for the given durations,
    /// in call order. The row is stored before the hold.
    pub fn delay_inserts(&self, delays: Vec<Duration>) {
        self.script.lock().unwrap().insert_delays = delays;
    }

    fn take_failure(slot: &mut usize, what: &str) -> Result<()> {
        if *slot > 0 {
            *slot -= 1;
            return Err(Error::backend("scripted", format!("{what} refused")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TableStore for ScriptedStore {
    async fn select(&self, table: &str, columns: &str, order: &OrderBy) -> Result<Vec<Book>> {
        self.counters.select.fetch_add(1, Ordering::SeqCst);
        Self::take_failure(&mut self.script.lock().unwrap().fail_select, "select")?;
        self.inner.select(table, columns, order).await
    }

    async fn insert(&self, table: &str, book: &NewBook) -> Result<Book> {
        self.counters.insert.fetch_add(1, Ordering::SeqCst);
        let delay = {
            let mut script = self.script.lock().unwrap();
            Self::take_failure(&mut script.fail_insert, "insert")?;
            if script.insert_delays.is_empty() {
                None
            } else {
                Some(script.insert_delays.remove(0))
            }
        };
        let row = self.inner.insert(table, book).await?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(row)
    }

    async fn update(&self, table: &str, changes: &BookChanges, filter: &Match) -> Result<()> {
        self.counters.update.fetch_add(1, Ordering::SeqCst);
        Self::take_failure(&mut self.script.lock().unwrap().fail_update, "update")?;
        self.inner.update(table, changes, filter).await
    }

    async fn delete(&self, table: &str, filter: &Match) -> Result<()> {
        self.counters.delete.fetch_add(1, Ordering::SeqCst);
        Self::take_failure(&mut self.script.lock().unwrap().fail_delete, "delete")?;
        self.inner.delete(table, filter).await
    }

    fn store_name(&self) -> &'static str {
        "scripted"
    }
}

/// Build a sync layer over `store` with default configuration
pub fn sync_layer(store: &ScriptedStore) -> (SyncLayer, mpsc::Receiver<SyncEvent>) {
    SyncLayer::new(
        Box::new(store.clone()),
        FormState::new(),
        BookList::new(),
        &BooklistConfig::default(),
    )
    .expect("default config is valid")
}

/// Drain every event currently queued
pub fn drain(events: &mut mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
