//! In-process item store.

use std::sync::RwLock;

use crate::error::DbError;
use crate::item::{validate_name, IdGenerator, Item, ItemChanges, ItemId};

use super::ItemStore;

/// Insertion-ordered item collection guarded by a `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<Vec<Item>>,
    ids: IdGenerator,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `items`.
    ///
    /// Fails with [`DbError::DataCorruption`] if two items share an identifier.
    pub fn with_items(items: Vec<Item>) -> Result<Self, DbError> {
        let mut seen = std::collections::HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                return Err(DbError::DataCorruption(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
        }
        Ok(Self {
            items: RwLock::new(items),
            ids: IdGenerator::new(),
        })
    }

    /// Runs `f` against the collection under the write lock.
    pub(crate) fn with_items_mut<T>(
        &self,
        f: impl FnOnce(&mut Vec<Item>) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let mut items = self.items.write().map_err(|_| DbError::LockPoisoned)?;
        f(&mut items)
    }

    /// Allocates a fresh identifier not present in `items`.
    pub(crate) fn allocate_id(&self, items: &[Item]) -> ItemId {
        loop {
            let id = self.ids.next_id();
            if !items.iter().any(|item| item.id == id) {
                return id;
            }
        }
    }
}

/// Inserts a new item into `items`.
pub(crate) fn insert_item(store: &MemoryStore, items: &mut Vec<Item>, name: String) -> Item {
    let item = Item {
        id: store.allocate_id(items),
        name,
    };
    items.push(item.clone());
    item
}

/// Applies `changes` to the item with `id`, if present.
pub(crate) fn update_item(
    items: &mut [Item],
    id: &ItemId,
    changes: &ItemChanges,
) -> Option<Item> {
    let item = items.iter_mut().find(|item| item.id == *id)?;
    changes.apply(item);
    Some(item.clone())
}

/// Removes the item with `id`.
pub(crate) fn remove_item(items: &mut Vec<Item>, id: &ItemId) -> Result<Item, DbError> {
    let index = items
        .iter()
        .position(|item| item.id == *id)
        .ok_or_else(|| DbError::ItemNotFound { id: id.to_string() })?;
    Ok(items.remove(index))
}

impl ItemStore for MemoryStore {
    fn create(&self, name: String) -> Result<Item, DbError> {
        validate_name(&name)?;
        self.with_items_mut(|items| Ok(insert_item(self, items, name)))
    }

    fn list(&self) -> Result<Vec<Item>, DbError> {
        let items = self.items.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(items.clone())
    }

    fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, DbError> {
        let items = self.items.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(items.iter().find(|item| item.id == *id).cloned())
    }

    fn update_by_id(&self, id: &ItemId, changes: ItemChanges) -> Result<Option<Item>, DbError> {
        if let Some(name) = &changes.name {
            validate_name(name)?;
        }
        self.with_items_mut(|items| Ok(update_item(items, id, &changes)))
    }

    fn delete_by_id(&self, id: &ItemId) -> Result<Item, DbError> {
        self.with_items_mut(|items| remove_item(items, id))
    }

    fn remove_all(&self) -> Result<usize, DbError> {
        self.with_items_mut(|items| {
            let removed = items.len();
            items.clear();
            Ok(removed)
        })
    }

    fn len(&self) -> Result<usize, DbError> {
        let items = self.items.read().map_err(|_| DbError::LockPoisoned)?;
        Ok(items.len())
    }
}
