//! Configuration types for the username registry
//!
//! This module defines the configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{FileAccountStore, MemoryAccountStore};
use crate::traits::AccountStore;

/// Main registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Account store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

impl RegistryConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store configuration
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()
    }
}

/// Account store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// File-based store
    File {
        /// Path to the account file
        path: String,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("File store path cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::File { .. } => "file",
        }
    }

    /// Open the configured store
    pub async fn open(&self) -> Result<Arc<dyn AccountStore>, crate::Error> {
        self.validate()?;
        match self {
            StoreConfig::Memory => Ok(Arc::new(MemoryAccountStore::new())),
            StoreConfig::File { path } => Ok(Arc::new(FileAccountStore::new(path).await?)),
        }
    }
}
