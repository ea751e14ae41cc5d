//! Item store persisted to a single JSON document file.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::item::{validate_name, Item, ItemChanges, ItemId};

use super::io_utils::{classify_io_error, retry_io_operation};
use super::memory::{insert_item, remove_item, update_item, MemoryStore};
use super::ItemStore;

/// Current document format version.
const DOCUMENT_VERSION: u32 = 1;

/// On-disk layout of the items document.
#[derive(Debug, Serialize, Deserialize)]
struct ItemsDocument {
    version: u32,
    /// CRC32 of the compact JSON encoding of `items`
    checksum: u32,
    items: Vec<Item>,
}

/// Item store backed by a JSON document file.
///
/// The whole collection lives in memory; every mutation is written to a
/// temporary file, synced and renamed over the document before it becomes
/// visible to readers.
#[derive(Debug)]
pub struct DocumentFileStore {
    path: PathBuf,
    inner: MemoryStore,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl DocumentFileStore {
    /// Opens the document at `path`, creating an empty collection if the
    /// file does not exist yet.
    pub fn open(
        path: impl Into<PathBuf>,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, DbError> {
        let path = path.into();
        let items = if path.exists() {
            retry_io_operation(
                || load_document(&path),
                max_retries,
                retry_delay_ms,
                "load_document",
            )?
        } else {
            Vec::new()
        };
        tracing::info!(
            "Loaded {} items from {}",
            items.len(),
            path.display()
        );

        Ok(Self {
            path,
            inner: MemoryStore::with_items(items)?,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `op` to a copy of the collection, persists the copy and
    /// only then swaps it in.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&MemoryStore, &mut Vec<Item>) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        self.inner.with_items_mut(|items| {
            let mut next = items.clone();
            let result = op(&self.inner, &mut next)?;
            retry_io_operation(
                || write_document(&self.path, &next),
                self.max_retries,
                self.retry_delay_ms,
                "write_document",
            )?;
            *items = next;
            Ok(result)
        })
    }
}

fn checksum(items: &[Item]) -> Result<u32, DbError> {
    let encoded =
        serde_json::to_vec(items).map_err(|e| DbError::SerializationError(e.to_string()))?;
    let mut hasher = Hasher::new();
    hasher.update(&encoded);
    Ok(hasher.finalize())
}

fn load_document(path: &Path) -> Result<Vec<Item>, DbError> {
    let mut file =
        File::open(path).map_err(|e| classify_io_error(e, "Failed to open items document"))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| classify_io_error(e, "Failed to read items document"))?;

    let document: ItemsDocument = serde_json::from_str(&contents).map_err(|e| {
        DbError::SerializationError(format!("Failed to parse items document: {}", e))
    })?;

    if document.version != DOCUMENT_VERSION {
        return Err(DbError::SerializationError(format!(
            "Unsupported items document version: {}",
            document.version
        )));
    }

    let actual = checksum(&document.items)?;
    if actual != document.checksum {
        return Err(DbError::DataCorruption(format!(
            "checksum mismatch in {} (stored {:08x}, computed {:08x})",
            path.display(),
            document.checksum,
            actual
        )));
    }

    Ok(document.items)
}

fn write_document(path: &Path, items: &[Item]) -> Result<(), DbError> {
    let document = ItemsDocument {
        version: DOCUMENT_VERSION,
        checksum: checksum(items)?,
        items: items.to_vec(),
    };
    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| DbError::SerializationError(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let written = write_temp_file(&temp_path, json.as_bytes()).and_then(|()| {
        fs::rename(&temp_path, path)
            .map_err(|e| classify_io_error(e, "Failed to rename items document"))
    });
    if written.is_err() {
        // Best effort; the original error is what matters.
        let _ = fs::remove_file(&temp_path);
    }
    written?;

    sync_parent_dir(path)
}

fn write_temp_file(temp_path: &Path, contents: &[u8]) -> Result<(), DbError> {
    let mut file = File::create(temp_path)
        .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(contents)
        .map_err(|e| classify_io_error(e, "Failed to write items document"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync items document"))
}

/// Makes the rename durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<(), DbError> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    File::open(parent)
        .and_then(|dir| dir.sync_all())
        .map_err(|e| classify_io_error(e, "Failed to sync data directory"))
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<(), DbError> {
    Ok(())
}

impl ItemStore for DocumentFileStore {
    fn create(&self, name: String) -> Result<Item, DbError> {
        validate_name(&name)?;
        let item = self.mutate(|store, items| Ok(insert_item(store, items, name)))?;
        tracing::debug!("Persisted item {}", item.id);
        Ok(item)
    }

    fn list(&self) -> Result<Vec<Item>, DbError> {
        self.inner.list()
    }

    fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, DbError> {
        self.inner.find_by_id(id)
    }

    fn update_by_id(&self, id: &ItemId, changes: ItemChanges) -> Result<Option<Item>, DbError> {
        if let Some(name) = &changes.name {
            validate_name(name)?;
        }
        // Unknown ids leave the document untouched.
        if self.inner.find_by_id(id)?.is_none() {
            return Ok(None);
        }
        self.mutate(|_, items| Ok(update_item(items, id, &changes)))
    }

    fn delete_by_id(&self, id: &ItemId) -> Result<Item, DbError> {
        self.mutate(|_, items| remove_item(items, id))
    }

    fn remove_all(&self) -> Result<usize, DbError> {
        self.mutate(|_, items| {
            let removed = items.len();
            items.clear();
            Ok(removed)
        })
    }

    fn len(&self) -> Result<usize, DbError> {
        self.inner.len()
    }
}
