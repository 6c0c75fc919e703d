//! Presentation controller
//!
//! [`BookListApp`] is what a front end binds to: it exposes the form
//! buffers and the displayed list for rendering and turns user actions
//! into sync layer calls.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::config::BooklistConfig;
use crate::error::Result;
use crate::record::Book;
use crate::state::{BookList, FormState};
use crate::sync::{CreateOutcome, SyncEvent, SyncLayer};
use crate::traits::TableStore;

/// Book list screen: add form, list, inline edit and delete
pub struct BookListApp {
    sync: SyncLayer,
    mounted: AtomicBool,
}

impl BookListApp {
    /// Build the screen on top of `store`
    pub fn new(
        store: Box<dyn TableStore>,
        config: &BooklistConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        let (sync, events) = SyncLayer::new(store, FormState::new(), BookList::new(), config)?;
        Ok((
            Self {
                sync,
                mounted: AtomicBool::new(false),
            },
            events,
        ))
    }

    /// Initial load; only the first call reaches the store
    ///
    /// Returns `false` if this was not the first call or the load failed.
    pub async fn mount(&self) -> bool {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.sync.fetch_all().await
    }

    /// Reload the list from the store
    pub async fn reload(&self) -> bool {
        self.sync.fetch_all().await
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.sync.form().name.set(name.into());
    }

    pub fn set_author(&self, author: impl Into<String>) {
        self.sync.form().author.set(author.into());
    }

    /// Submit the add form
    pub async fn save(&self) -> CreateOutcome {
        let form = self.sync.form();
        let (name, author) = (form.name.get(), form.author.get());
        self.sync.create(&name, &author).await
    }

    /// Name input of a listed book changed
    pub fn edit_name(&self, book: &Book, name: impl Into<String>) {
        self.sync.form().edit_name(book, name);
    }

    /// Author input of a listed book changed
    pub fn edit_author(&self, book: &Book, author: impl Into<String>) {
        self.sync.form().edit_author(book, author);
    }

    /// Push the edit buffer to the store
    ///
    /// With no edit in progress the update targets the empty identifier
    /// and matches nothing.
    pub async fn commit_edit(&self) {
        let edited = self.sync.form().edit.get().unwrap_or_default();
        self.sync.update(&edited).await;
    }

    /// Delete button of a listed book
    pub async fn delete(&self, id: &str) -> bool {
        self.sync.remove(id).await
    }

    /// Books as currently displayed
    pub fn books(&self) -> Vec<Book> {
        self.sync.books().get()
    }

    pub fn form(&self) -> &FormState {
        self.sync.form()
    }

    pub fn list(&self) -> &BookList {
        self.sync.books()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTableStore;

    fn app(store: &MemoryTableStore) -> BookListApp {
        let (app, _events) =
            BookListApp::new(Box::new(store.clone()), &BooklistConfig::default()).unwrap();
        app
    }

    #[tokio::test]
    async fn test_mount_fetches_once() {
        let store = MemoryTableStore::new();
        let app = app(&store);

        assert!(app.mount().await);
        assert!(!app.mount().await);
        assert!(app.reload().await);
    }

    #[tokio::test]
    async fn test_save_reads_form_buffers() {
        let store = MemoryTableStore::new();
        let app = app(&store);
        app.set_name("Dune");
        app.set_author("Herbert");

        let outcome = app.save().await;
        assert!(matches!(outcome, CreateOutcome::Created(ref b) if b.name == "Dune"));
        assert_eq!(app.form().name.get(), "");
        assert_eq!(app.form().author.get(), "");
        assert_eq!(app.books().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_edit_reaches_store_only() {
        let store = MemoryTableStore::new();
        let app = app(&store);
        app.set_name("Dune");
        app.set_author("Herbert");
        app.save().await;

        let shown = app.books()[0].clone();
        app.edit_name(&shown, "Dune Messiah");
        app.commit_edit().await;

        assert_eq!(app.books()[0].name, "Dune");
        assert_eq!(
            store.get("books", &shown.id).await.unwrap().name,
            "Dune Messiah"
        );

        app.reload().await;
        assert_eq!(app.books()[0].name, "Dune Messiah");
    }

    #[tokio::test]
    async fn test_commit_without_edit_changes_nothing() {
        let store = MemoryTableStore::new();
        let app = app(&store);
        app.set_name("Dune");
        app.set_author("Herbert");
        app.save().await;

        app.commit_edit().await;
        app.reload().await;
        assert_eq!(app.books()[0].name, "Dune");
    }
}
