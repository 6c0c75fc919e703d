//! Form and list state holders
//!
//! Plain observable cells, no validation. The non-empty check for new
//! books lives in [`SyncLayer::create`](crate::sync::SyncLayer::create).

use crate::cell::Cell;
use crate::record::Book;

/// Input buffers of the add form plus the in-place edit buffer
#[derive(Debug, Clone, Default)]
pub struct FormState {
    /// Proposed book name
    pub name: Cell<String>,
    /// Proposed book author
    pub author: Cell<String>,
    /// Record currently being edited in place, if any
    pub edit: Cell<Option<Book>>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty both add-form buffers
    pub fn clear(&self) {
        self.name.set(String::new());
        self.author.set(String::new());
    }

    /// Edit buffer becomes a copy of `book` with the name replaced
    ///
    /// The copy is taken from `book` as listed, so a pending edit of the
    /// other field is dropped.
    pub fn edit_name(&self, book: &Book, name: impl Into<String>) {
        self.edit.set(Some(book.with_name(name)));
    }

    /// Edit buffer becomes a copy of `book` with the author replaced
    pub fn edit_author(&self, book: &Book, author: impl Into<String>) {
        self.edit.set(Some(book.with_author(author)));
    }

    /// Drop the edit buffer
    pub fn cancel_edit(&self) {
        self.edit.set(None);
    }
}

/// The ordered books currently displayed
///
/// Written by the sync layer only.
#[derive(Debug, Clone, Default)]
pub struct BookList {
    books: Cell<Vec<Book>>,
}

impl BookList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the displayed books
    pub fn get(&self) -> Vec<Book> {
        self.books.get()
    }

    pub fn len(&self) -> usize {
        self.books.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.books.with(Vec::is_empty)
    }

    /// Replace the whole list
    pub fn replace(&self, books: Vec<Book>) {
        self.books.set(books);
    }

    /// Put `book` in front of the current list
    pub fn prepend(&self, book: Book) {
        self.books.update(|prev| {
            let mut next = Vec::with_capacity(prev.len() + 1);
            next.push(book);
            next.extend(prev.iter().cloned());
            next
        });
    }

    /// The underlying cell, for subscribing to changes
    pub fn cell(&self) -> &Cell<Vec<Book>> {
        &self.books
    }
}
