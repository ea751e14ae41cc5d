//! Storage adapters for the items collection.
//!
//! The HTTP layer only sees the [`ItemStore`] trait. Two implementations
//! are provided: [`MemoryStore`] for tests and ephemeral runs, and
//! [`DocumentFileStore`] which mirrors the collection to a JSON document
//! file on every mutation.

mod document;
mod io_utils;
mod memory;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::error::DbError;
use crate::item::{Item, ItemChanges, ItemId};

pub use document::DocumentFileStore;
pub use memory::MemoryStore;

/// Persistence facade for shopping list items.
///
/// Implementations perform one atomic operation per call and hold no
/// business rules beyond what is needed to keep the collection valid.
pub trait ItemStore: Send + Sync + std::fmt::Debug {
    /// Persists a new item and returns it with its assigned identifier.
    fn create(&self, name: String) -> Result<Item, DbError>;

    /// Returns every item in insertion order.
    fn list(&self) -> Result<Vec<Item>, DbError>;

    /// Looks up a single item.
    fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, DbError>;

    /// Applies `changes` to the item and returns the updated item.
    ///
    /// Returns `Ok(None)` when no item has the given identifier.
    fn update_by_id(&self, id: &ItemId, changes: ItemChanges) -> Result<Option<Item>, DbError>;

    /// Removes the item and returns it.
    ///
    /// Fails with [`DbError::ItemNotFound`] when no item has the given identifier.
    fn delete_by_id(&self, id: &ItemId) -> Result<Item, DbError>;

    /// Removes every item, returning how many were removed.
    fn remove_all(&self) -> Result<usize, DbError>;

    /// Number of stored items.
    fn len(&self) -> Result<usize, DbError> {
        Ok(self.list()?.len())
    }

    /// Whether the store holds no items.
    fn is_empty(&self) -> Result<bool, DbError> {
        Ok(self.len()? == 0)
    }
}

/// Parsed store location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    /// Volatile in-process store
    Memory,
    /// JSON document file at the given path
    File(PathBuf),
}

impl FromStr for StoreUrl {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" => Err(DbError::InvalidUrl(s.to_string())),
            "memory" | "memory://" => Ok(StoreUrl::Memory),
            _ => {
                if let Some(path) = s.strip_prefix("file://") {
                    if path.is_empty() {
                        return Err(DbError::InvalidUrl(s.to_string()));
                    }
                    Ok(StoreUrl::File(PathBuf::from(path)))
                } else if s.contains("://") {
                    Err(DbError::InvalidUrl(s.to_string()))
                } else {
                    Ok(StoreUrl::File(PathBuf::from(s)))
                }
            }
        }
    }
}

/// Opens the store described by `config.database_url`.
pub fn open_store(config: &ServiceConfig) -> Result<Arc<dyn ItemStore>, DbError> {
    let url: StoreUrl = config.database_url.parse()?;
    match url {
        StoreUrl::Memory => {
            tracing::info!("Using in-memory item store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreUrl::File(path) => {
            tracing::info!("Using document file store at {}", path.display());
            let store = DocumentFileStore::open(
                path,
                config.persistence_max_retries,
                config.persistence_retry_delay_ms,
            )?;
            Ok(Arc::new(store))
        }
    }
}
