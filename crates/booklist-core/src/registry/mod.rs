//! Plugin-based store registry
//!
//! The registry maps store type names to factories so front ends can
//! build a [`TableStore`] from configuration without hardcoding backends.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use booklist_core::{StoreConfig, StoreRegistry};
//!
//! let registry = StoreRegistry::with_builtin();
//! booklist_store_rest::register(&registry);
//!
//! let store = registry.create_store(&StoreConfig::Memory)?;
//! ```
//!
//! ## Registration
//!
//! Backend crates expose a `register()` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &StoreRegistry) {
//!     registry.register_store("rest", Box::new(RestTableStoreFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::{FileTableStoreFactory, MemoryTableStoreFactory};
use crate::traits::{TableStore, TableStoreFactory};

/// Store registry for plugin-based table store creation
///
/// ## Thread Safety
///
/// Interior mutability with RwLock: concurrent lookups, exclusive
/// registration.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Box<dyn TableStoreFactory>>>,
}

impl StoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` stores registered
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryTableStoreFactory));
        registry.register_store("file", Box::new(FileTableStoreFactory));
        registry
    }

    /// Register a table store factory
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn TableStoreFactory>) {
        let name = name.into();
        tracing::debug!(store = %name, "Registering table store");
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name, factory);
    }

    /// Create a table store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn TableStore>)`: Created store instance
    /// - `Err(Error)`: If the configuration is invalid, the store type is
    ///   not registered or creation fails
    pub fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn TableStore>> {
        config.validate()?;

        let store_type = config.type_name();
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);

        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?;

        factory.create(config)
    }

    /// List all registered store types, sorted
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}
