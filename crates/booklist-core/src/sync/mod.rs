//! Sync layer between the displayed state and the table store
//!
//! The SyncLayer is responsible for:
//! - Loading the book list from the store (newest first)
//! - Inserting new books and putting them at the top of the list
//! - Deleting books and reloading the list afterwards
//! - Pushing in-place edits to the store
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   invoke   ┌─────────────┐  select/insert/   ┌────────────┐
//! │ Presentation │──────────▶│  SyncLayer  │──update/delete──▶│ TableStore │
//! └──────────────┘            └─────────────┘                   └────────────┘
//!        ▲                          │
//!        │ re-render                │ write
//!        │                          ▼
//!        │                 ┌──────────────────┐
//!        └─────────────────│ BookList / Form  │
//!                          └──────────────────┘
//! ```
//!
//! ## Reconciliation rules
//!
//! | operation   | success                    | failure                    |
//! |-------------|----------------------------|----------------------------|
//! | `fetch_all` | replace list               | log, keep stale list       |
//! | `create`    | prepend row, clear form    | log, clear form            |
//! | `remove`    | `fetch_all` once           | log, no reload             |
//! | `update`    | nothing local              | nothing at all             |
//!
//! An empty name or author makes `create` a no-op: no request, and the
//! form buffers are left as typed.
//!
//! No operation is retried, cancelled or serialized against another.
//! Concurrent calls each run to completion and the last write to the
//! list wins.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::config::{BooklistConfig, TableConfig};
use crate::error::Result;
use crate::record::{Book, NewBook};
use crate::state::{BookList, FormState};
use crate::traits::{Match, OrderBy, TableStore};

/// Column projection used for bulk reads
const SELECT_ALL: &str = "*";

/// Events emitted by the SyncLayer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// List replaced from the store
    Fetched { count: usize },

    /// Bulk read failed, list left as is
    FetchFailed { error: String },

    /// Create ignored because a field was empty
    CreateSkipped,

    /// New row inserted and prepended
    Created { id: String },

    /// Insert failed
    CreateFailed { error: String },

    /// Row deleted (a reload follows)
    Removed { id: String },

    /// Delete failed, no reload
    RemoveFailed { id: String, error: String },

    /// Edit accepted by the store
    UpdateSent { id: String },
}

/// Result of [`SyncLayer::create`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Name or author was empty; the store was not contacted
    Skipped,
    /// Row stored and now first in the list
    Created(Book),
    /// The store rejected the insert or could not be reached
    Failed,
}

/// Sync layer
///
/// Owns the store handle and writes the [`BookList`]; clears the
/// [`FormState`] buffers after every create attempt that reaches the
/// store.
///
/// ## Threading
///
/// All operations take `&self`; wrap the layer in an `Arc` to issue
/// operations from several tasks.
pub struct SyncLayer {
    /// Table store
    store: Box<dyn TableStore>,

    /// Table addressing
    table: TableConfig,

    /// Add-form and edit buffers
    form: FormState,

    /// Displayed books
    books: BookList,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncLayer {
    /// Create a new sync layer
    ///
    /// # Parameters
    ///
    /// - `store`: Table store implementation
    /// - `form`: Form state holder to clear after creates
    /// - `books`: List state holder to reconcile into
    /// - `config`: Booklist configuration
    ///
    /// # Returns
    ///
    /// A tuple of (layer, event_receiver) where event_receiver yields sync events
    pub fn new(
        store: Box<dyn TableStore>,
        form: FormState,
        books: BookList,
        config: &BooklistConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.table.validate()?;
        config.sync.validate()?;

        let (tx, rx) = mpsc::channel(config.sync.event_channel_capacity);

        let layer = Self {
            store,
            table: config.table.clone(),
            form,
            books,
            event_tx: tx,
        };

        Ok((layer, rx))
    }

    /// Replace the displayed list with every row of the table, newest first
    ///
    /// # Returns
    ///
    /// `true` if the list was replaced, `false` if the read failed and the
    /// previous list was kept.
    pub async fn fetch_all(&self) -> bool {
        let order = OrderBy::desc(self.table.order_column.as_str());
        match self
            .store
            .select(&self.table.name, SELECT_ALL, &order)
            .await
        {
            Ok(rows) => {
                let count = rows.len();
                self.books.replace(rows);
                info!(table = %self.table.name, count, "Book list loaded");
                self.emit_event(SyncEvent::Fetched { count });
                true
            }
            Err(e) => {
                error!(
                    table = %self.table.name,
                    store = self.store.store_name(),
                    "Failed to fetch books: {}",
                    e
                );
                self.emit_event(SyncEvent::FetchFailed {
                    error: e.to_string(),
                });
                false
            }
        }
    }

    /// Insert a new book and show it at the top of the list
    ///
    /// Does nothing when `name` or `author` is empty (no trimming). Once
    /// a request has been issued, both form buffers are cleared whatever
    /// the outcome.
    pub async fn create(&self, name: &str, author: &str) -> CreateOutcome {
        if name.is_empty() || author.is_empty() {
            debug!("Name or author empty, skipping create");
            self.emit_event(SyncEvent::CreateSkipped);
            return CreateOutcome::Skipped;
        }

        let outcome = match self
            .store
            .insert(&self.table.name, &NewBook::new(name, author))
            .await
        {
            Ok(row) => {
                info!(id = %row.id, "Book created");
                self.emit_event(SyncEvent::Created { id: row.id.clone() });
                self.books.prepend(row.clone());
                CreateOutcome::Created(row)
            }
            Err(e) => {
                error!(store = self.store.store_name(), "Failed to create book: {}", e);
                self.emit_event(SyncEvent::CreateFailed {
                    error: e.to_string(),
                });
                CreateOutcome::Failed
            }
        };

        self.form.clear();
        outcome
    }

    /// Delete a book, then reload the whole list from the store
    ///
    /// # Returns
    ///
    /// `true` if the delete succeeded (the reload result is not reflected
    /// here), `false` if it failed, in which case no reload happens.
    pub async fn remove(&self, id: &str) -> bool {
        match self.store.delete(&self.table.name, &Match::id(id)).await {
            Ok(()) => {
                info!(id, "Book deleted");
                self.emit_event(SyncEvent::Removed { id: id.to_string() });
                self.fetch_all().await;
                true
            }
            Err(e) => {
                error!(id, store = self.store.store_name(), "Failed to delete book: {}", e);
                self.emit_event(SyncEvent::RemoveFailed {
                    id: id.to_string(),
                    error: e.to_string(),
                });
                false
            }
        }
    }

    /// Push the name and author of `edited` to the row with its identifier
    ///
    /// The displayed list is not touched and not reloaded; it keeps the
    /// pre-edit values until the next [`fetch_all`](Self::fetch_all).
    /// Failures are dropped without any diagnostic.
    pub async fn update(&self, edited: &Book) {
        let result = self
            .store
            .update(&self.table.name, &edited.changes(), &Match::id(&edited.id))
            .await;

        if result.is_ok() {
            self.emit_event(SyncEvent::UpdateSent {
                id: edited.id.clone(),
            });
        }
    }

    /// Form state holder shared with the presentation
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// List state holder shared with the presentation
    pub fn books(&self) -> &BookList {
        &self.books
    }

    /// Table this layer synchronizes
    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Sync event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
