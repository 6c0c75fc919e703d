// # File Table Store
//
// JSON file-backed implementation of TableStore for local use.
//
// ## Crash Recovery
//
// - Atomic writes: write-then-rename
// - Automatic backup: `.backup` holds the previous good file
// - Recovery: falls back to the backup when the main file does not parse
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "tables": {
//     "books": [
//       { "id": "…", "name": "Dune", "author": "Herbert", "created_at": "2025-01-09T12:00:00Z" }
//     ]
//   },
//   "last_created": "2025-01-09T12:00:00Z"
// }
// ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::memory::Tables;
use crate::Error;
use crate::config::StoreConfig;
use crate::record::{Book, BookChanges, NewBook};
use crate::traits::table_store::{
    Match, OrderBy, TableStore, TableStoreFactory, require_table,
};

/// Table file format version
const TABLE_FILE_VERSION: &str = "1.0";

/// File-backed table store
///
/// Every mutation is written through to disk before the call returns.
///
/// # Example
///
/// ```rust,no_run
/// use booklist_core::record::NewBook;
/// use booklist_core::store::FileTableStore;
/// use booklist_core::traits::TableStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileTableStore::new("/var/lib/booklist/books.json").await?;
///     store.insert("books", &NewBook::new("Dune", "Herbert")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileTableStore {
    path: PathBuf,
    state: Arc<RwLock<Tables>>,
}

/// Serializable table file format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct TableFileFormat {
    version: String,
    #[serde(flatten)]
    tables: Tables,
}

impl FileTableStore {
    /// Create or load a file table store
    ///
    /// Creates parent directories if needed. A corrupted file is replaced
    /// by its backup; with no usable backup the store starts empty.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create table directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let tables = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(tables)),
        })
    }

    async fn load_with_recovery(path: &Path) -> Result<Tables, Error> {
        match Self::load(path).await {
            Ok(tables) => {
                tracing::debug!("Loaded table file: {} rows", tables.row_count());
                Ok(tables)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Table file {} appears corrupted: {}. Attempting recovery from backup.",
                    path.display(),
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty tables.");
                    return Ok(Tables::default());
                }

                match Self::load(&backup_path).await {
                    Ok(tables) => {
                        tracing::info!("Recovered {} rows from backup", tables.row_count());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore table file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(tables)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with empty tables.",
                            backup_err
                        );
                        Ok(Tables::default())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load(path: &Path) -> Result<Tables, Error> {
        if !path.exists() {
            tracing::debug!("Table file does not exist: {}", path.display());
            return Ok(Tables::default());
        }

        let content = fs::read_to_string(path).await?;
        let file: TableFileFormat = serde_json::from_str(&content)?;

        if file.version != TABLE_FILE_VERSION {
            tracing::warn!(
                "Table file version mismatch: expected {}, got {}. Attempting to load anyway.",
                TABLE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.tables)
    }

    /// Write the tables to disk atomically
    async fn persist(&self, tables: &Tables) -> Result<(), Error> {
        let file = TableFileFormat {
            version: TABLE_FILE_VERSION.to_string(),
            tables: tables.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.write_all(json.as_bytes()).await?;
            out.flush().await?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Tables written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the table file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TableStore for FileTableStore {
    async fn select(
        &self,
        table: &str,
        _columns: &str,
        order: &OrderBy,
    ) -> Result<Vec<Book>, Error> {
        require_table(table)?;
        Ok(self.state.read().await.select(table, order))
    }

    async fn insert(&self, table: &str, book: &NewBook) -> Result<Book, Error> {
        require_table(table)?;
        // Holding the write guard across the disk write keeps file order
        // identical to mutation order.
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        let row = next.insert(table, book);
        self.persist(&next).await?;
        *guard = next;
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        changes: &BookChanges,
        filter: &Match,
    ) -> Result<(), Error> {
        require_table(table)?;
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        if next.update(table, changes, filter) == 0 {
            return Ok(());
        }
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Match) -> Result<(), Error> {
        require_table(table)?;
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        if next.delete(table, filter) == 0 {
            return Ok(());
        }
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for creating file table stores
///
/// Loading the file is async, so the factory hands out a store that
/// loads lazily on first use.
pub struct FileTableStoreFactory;

impl TableStoreFactory for FileTableStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn TableStore>, Error> {
        match config {
            StoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(Error::config("File store path is required"));
                }
                Ok(Box::new(LazyFileTableStore::new(path)))
            }
            _ => Err(Error::config("Invalid config for file store")),
        }
    }
}

/// File table store opened on first request
#[derive(Debug)]
struct LazyFileTableStore {
    path: PathBuf,
    store: tokio::sync::OnceCell<FileTableStore>,
}

impl LazyFileTableStore {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: tokio::sync::OnceCell::new(),
        }
    }

    async fn get(&self) -> Result<&FileTableStore, Error> {
        self.store
            .get_or_try_init(|| FileTableStore::new(&self.path))
            .await
    }
}

#[async_trait]
impl TableStore for LazyFileTableStore {
    async fn select(
        &self,
        table: &str,
        columns: &str,
        order: &OrderBy,
    ) -> Result<Vec<Book>, Error> {
        self.get().await?.select(table, columns, order).await
    }

    async fn insert(&self, table: &str, book: &NewBook) -> Result<Book, Error> {
        self.get().await?.insert(table, book).await
    }

    async fn update(
        &self,
        table: &str,
        changes: &BookChanges,
        filter: &Match,
    ) -> Result<(), Error> {
        self.get().await?.update(table, changes, filter).await
    }

    async fn delete(&self, table: &str, filter: &Match) -> Result<(), Error> {
        self.get().await?.delete(table, filter).await
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}
