//! Configuration types for the booklist manager
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main booklist configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BooklistConfig {
    /// Table store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Table addressing
    #[serde(default)]
    pub table: TableConfig,

    /// Sync layer settings
    #[serde(default)]
    pub sync: SyncConfig,
}

impl BooklistConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.table.validate()?;
        self.sync.validate()?;
        Ok(())
    }
}

/// Table store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// JSON file-backed store
    File {
        /// Path to the table file
        path: String,
    },

    /// Hosted table service reached over REST
    Rest {
        /// Project base URL (e.g. `https://xyz.example.co`)
        url: String,
        /// API key sent with every request
        api_key: String,
        /// Optional schema profile header
        #[serde(default)]
        schema: Option<String>,
    },

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File store path cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Rest { url, api_key, .. } => {
                if url.is_empty() {
                    return Err(crate::Error::config("REST store URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "REST store URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if api_key.is_empty() {
                    return Err(crate::Error::config("REST store API key cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the store type name used for registry lookup
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::File { .. } => "file",
            StoreConfig::Rest { .. } => "rest",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Table addressing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table holding the books
    #[serde(default = "default_table_name")]
    pub name: String,

    /// Store-managed creation timestamp column used for ordering
    #[serde(default = "default_order_column")]
    pub order_column: String,
}

impl TableConfig {
    /// Validate the table configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("Table name cannot be empty"));
        }
        if self.order_column.is_empty() {
            return Err(crate::Error::config("Order column cannot be empty"));
        }
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: default_table_name(),
            order_column: default_order_column(),
        }
    }
}

fn default_table_name() -> String {
    "books".to_string()
}

fn default_order_column() -> String {
    "created_at".to_string()
}

/// Sync layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Validate the sync configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    256
}
