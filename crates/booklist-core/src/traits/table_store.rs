// # Table Store Trait
//
// Defines the interface to the hosted table store holding the books.
//
// ## Purpose
//
// The table store is the single source of truth. The sync layer only
// ever talks to it through four logical operations:
// - `select`: bulk read with ordering
// - `insert`: create a row, store assigns id and timestamp
// - `update`: change fields of the rows matching a predicate
// - `delete`: remove the rows matching a predicate
//
// ## Implementations
//
// - Memory: `MemoryTableStore` (tests, offline runs)
// - File: `FileTableStore` (local JSON file)
// - REST: `booklist-store-rest` crate
//
// ## Usage
//
// ```rust,ignore
// use booklist_core::traits::{Match, OrderBy, TableStore};
//
// let rows = store.select("books", "*", &OrderBy::desc("created_at")).await?;
// store.delete("books", &Match::id(&rows[0].id)).await?;
// ```

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::record::{Book, BookChanges, NewBook, ID_COLUMN};

/// Ordering applied to a bulk select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// `true` for ascending, `false` for descending
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Equality predicate selecting the rows an update or delete applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub column: String,
    pub value: String,
}

impl Match {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Match on the identifier column
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(ID_COLUMN, value)
    }

    /// Whether `book` satisfies this predicate
    ///
    /// Unknown columns never match.
    pub fn matches(&self, book: &Book) -> bool {
        match self.column.as_str() {
            "id" => book.id == self.value,
            "name" => book.name == self.value,
            "author" => book.author == self.value,
            _ => false,
        }
    }
}

/// Trait for table store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Semantics
///
/// - No retry, no timeout policy beyond what the transport imposes
/// - `update` and `delete` matching zero rows are successes
/// - `insert` returns the row as stored, including the assigned
///   identifier and creation timestamp
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Read every row of `table`
    ///
    /// # Parameters
    ///
    /// - `table`: Table name
    /// - `columns`: Column projection (`"*"` for all)
    /// - `order`: Ordering to apply
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Book>)`: All rows, ordered
    /// - `Err(Error)`: Transport or store error
    async fn select(
        &self,
        table: &str,
        columns: &str,
        order: &OrderBy,
    ) -> Result<Vec<Book>, crate::Error>;

    /// Insert a single row and return it as stored
    ///
    /// # Returns
    ///
    /// - `Ok(Book)`: The stored row with id and timestamp assigned
    /// - `Err(Error)`: Transport or store error
    async fn insert(&self, table: &str, book: &NewBook) -> Result<Book, crate::Error>;

    /// Update the rows matching `filter`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Request accepted (possibly zero rows changed)
    /// - `Err(Error)`: Transport or store error
    async fn update(
        &self,
        table: &str,
        changes: &BookChanges,
        filter: &Match,
    ) -> Result<(), crate::Error>;

    /// Delete the rows matching `filter`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Request accepted (possibly zero rows removed)
    /// - `Err(Error)`: Transport or store error
    async fn delete(&self, table: &str, filter: &Match) -> Result<(), crate::Error>;

    /// Short backend name used in logs and errors
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing table stores from configuration
pub trait TableStoreFactory: Send + Sync {
    /// Create a TableStore instance from configuration
    ///
    /// # Returns
    ///
    /// A boxed TableStore trait object
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn TableStore>, crate::Error>;
}

/// Reject an empty table name before any store work is done
pub fn require_table(table: &str) -> Result<(), crate::Error> {
    if table.is_empty() {
        return Err(crate::Error::invalid_input("Table name cannot be empty"));
    }
    Ok(())
}

/// Order `rows` in place the way a store honouring `order` would
///
/// Only `created_at`, `name`, `author` and `id` are orderable; rows
/// without a timestamp sort before timestamped ones when ascending.
pub fn sort_rows(rows: &mut [Book], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ord = match order.column.as_str() {
            "name" => a.name.cmp(&b.name),
            "author" => a.author.cmp(&b.author),
            "id" => a.id.cmp(&b.id),
            _ => a.created_at.cmp(&b.created_at),
        };
        if order.ascending { ord } else { ord.reverse() }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn book(id: &str, secs: i64) -> Book {
        Book {
            id: id.to_string(),
            name: format!("name-{id}"),
            author: format!("author-{id}"),
            created_at: Utc.timestamp_opt(secs, 0).single(),
        }
    }

    #[test]
    fn test_sort_rows_newest_first() {
        let mut rows = vec![book("a", 10), book("c", 30), book("b", 20)];
        sort_rows(&mut rows, &OrderBy::desc("created_at"));
        let ids: Vec<_> = rows.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn test_sort_rows_ascending_by_name() {
        let mut rows = vec![book("b", 10), book("c", 30), book("a", 20)];
        sort_rows(&mut rows, &OrderBy::asc("name"));
        let ids: Vec<_> = rows.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_empty_table_name_is_invalid_input() {
        assert!(require_table("books").is_ok());
        assert!(matches!(
            require_table(""),
            Err(crate::Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_match_on_id() {
        let b = book("x", 1);
        assert!(Match::id("x").matches(&b));
        assert!(!Match::id("y").matches(&b));
        assert!(!Match::new("isbn", "x").matches(&b));
    }
}
