// # booklist-core
//
// Core library for the booklist manager.
//
// ## Architecture Overview
//
// - **TableStore**: Trait for the hosted table holding the books
// - **Cell**: Observable value with get/set/subscribe
// - **FormState / BookList**: State holders behind the screen
// - **SyncLayer**: Issues store requests and reconciles the list
// - **BookListApp**: Presentation controller wiring the above
// - **StoreRegistry**: Name-based registry of store factories
//
// ## Design Principles
//
// 1. **Store is the source of truth**: the displayed list is a cache
// 2. **Pluggable stores**: backends register factories, no if-else chains
// 3. **Library-first**: front ends only bind to `BookListApp`

pub mod app;
pub mod cell;
pub mod config;
pub mod error;
pub mod record;
pub mod registry;
pub mod state;
pub mod store;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use app::BookListApp;
pub use cell::Cell;
pub use config::{BooklistConfig, StoreConfig, SyncConfig, TableConfig};
pub use error::{Error, Result};
pub use record::{Book, BookChanges, NewBook};
pub use registry::StoreRegistry;
pub use state::{BookList, FormState};
pub use store::{FileTableStore, MemoryTableStore};
pub use sync::{CreateOutcome, SyncEvent, SyncLayer};
pub use traits::{Match, OrderBy, TableStore, TableStoreFactory};
