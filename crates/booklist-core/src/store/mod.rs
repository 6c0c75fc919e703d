// # Table Store Implementations
//
// This module provides implementations of the TableStore trait that run
// without a remote service. The hosted REST store lives in its own crate.

pub mod file;
pub mod memory;

pub use file::{FileTableStore, FileTableStoreFactory};
pub use memory::{MemoryTableStore, MemoryTableStoreFactory};
