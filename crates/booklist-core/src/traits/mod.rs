//! Core traits for the booklist manager
//!
//! - [`TableStore`]: Remote (or local) table holding the book rows

pub mod table_store;

pub use table_store::{Match, OrderBy, TableStore, TableStoreFactory, require_table, sort_rows};
