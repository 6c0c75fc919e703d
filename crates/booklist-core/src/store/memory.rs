// # Memory Table Store
//
// In-memory implementation of TableStore.
//
// ## Purpose
//
// Behaves like a hosted table store without any network: assigns
// identifiers and creation timestamps on insert, honours ordering on
// select and equality matching on update/delete. Useful for tests,
// demos and offline runs.
//
// ## Crash Behavior
//
// - All rows are lost on restart
// - Tables are created on first insert; selecting a missing table
//   yields no rows

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::Error;
use crate::config::StoreConfig;
use crate::record::{Book, BookChanges, NewBook};
use crate::traits::table_store::{
    Match, OrderBy, TableStore, TableStoreFactory, require_table, sort_rows,
};

/// In-memory table store implementation
///
/// Rows live in a map of table name to row vector behind a RwLock.
///
/// # Example
///
/// ```rust,no_run
/// use booklist_core::record::NewBook;
/// use booklist_core::store::MemoryTableStore;
/// use booklist_core::traits::{OrderBy, TableStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryTableStore::new();
///
///     let dune = store.insert("books", &NewBook::new("Dune", "Herbert")).await?;
///     assert!(!dune.id.is_empty());
///
///     let rows = store.select("books", "*", &OrderBy::desc("created_at")).await?;
///     assert_eq!(rows.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    inner: Arc<RwLock<Tables>>,
}

/// Rows of every table plus the timestamp clock
///
/// Shared by the memory and file stores; the file store persists it as is.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct Tables {
    #[serde(default)]
    tables: HashMap<String, Vec<Book>>,
    #[serde(default)]
    last_created: Option<DateTime<Utc>>,
}

impl Tables {
    pub(crate) fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub(crate) fn select(&self, table: &str, order: &OrderBy) -> Vec<Book> {
        let mut rows = self.tables.get(table).cloned().unwrap_or_default();
        sort_rows(&mut rows, order);
        rows
    }

    pub(crate) fn insert(&mut self, table: &str, book: &NewBook) -> Book {
        let created_at = self.next_timestamp();
        let row = Book {
            id: uuid::Uuid::new_v4().to_string(),
            name: book.name.clone(),
            author: book.author.clone(),
            created_at: Some(created_at),
        };
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// Returns the number of rows changed
    pub(crate) fn update(&mut self, table: &str, changes: &BookChanges, filter: &Match) -> usize {
        let Some(rows) = self.tables.get_mut(table) else {
            return 0;
        };
        let mut changed = 0;
        for row in rows.iter_mut().filter(|b| filter.matches(b)) {
            row.name = changes.name.clone();
            row.author = changes.author.clone();
            changed += 1;
        }
        changed
    }

    /// Returns the number of rows removed
    pub(crate) fn delete(&mut self, table: &str, filter: &Match) -> usize {
        let Some(rows) = self.tables.get_mut(table) else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|b| !filter.matches(b));
        before - rows.len()
    }

    // Creation timestamps are strictly increasing even when the clock is
    // coarse or two inserts land in the same instant.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(ts);
        ts
    }
}

impl MemoryTableStore {
    /// Create a new empty memory table store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `rows` in `table`
    ///
    /// Rows are kept as given, timestamps included.
    pub async fn with_rows(table: &str, rows: Vec<Book>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.inner.write().await;
            if let Some(latest) = rows.iter().filter_map(|b| b.created_at).max() {
                guard.last_created = Some(latest);
            }
            guard.tables.insert(table.to_string(), rows);
        }
        store
    }

    /// Number of rows in `table`
    pub async fn len(&self, table: &str) -> usize {
        self.inner
            .read()
            .await
            .tables
            .get(table)
            .map_or(0, Vec::len)
    }

    /// Check if `table` has no rows
    pub async fn is_empty(&self, table: &str) -> bool {
        self.len(table).await == 0
    }

    /// Look a row up by identifier
    pub async fn get(&self, table: &str, id: &str) -> Option<Book> {
        self.inner
            .read()
            .await
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|b| b.id == id).cloned())
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn select(
        &self,
        table: &str,
        _columns: &str,
        order: &OrderBy,
    ) -> Result<Vec<Book>, Error> {
        require_table(table)?;
        Ok(self.inner.read().await.select(table, order))
    }

    async fn insert(&self, table: &str, book: &NewBook) -> Result<Book, Error> {
        require_table(table)?;
        Ok(self.inner.write().await.insert(table, book))
    }

    async fn update(
        &self,
        table: &str,
        changes: &BookChanges,
        filter: &Match,
    ) -> Result<(), Error> {
        require_table(table)?;
        self.inner.write().await.update(table, changes, filter);
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Match) -> Result<(), Error> {
        require_table(table)?;
        self.inner.write().await.delete(table, filter);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory table stores
pub struct MemoryTableStoreFactory;

impl TableStoreFactory for MemoryTableStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn TableStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryTableStore::new())),
            _ => Err(Error::config("Invalid config for memory store")),
        }
    }
}
