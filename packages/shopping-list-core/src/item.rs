//! Item model and identifier generation.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DbError;

/// Length of an item identifier in bytes.
pub const ITEM_ID_LEN: usize = 12;

/// Counter values wrap at 24 bits.
const COUNTER_MASK: u32 = 0x00ff_ffff;

/// Opaque item identifier.
///
/// Layout: 4-byte big-endian seconds since the epoch, 5 random bytes,
/// 3-byte big-endian counter. Rendered as 24 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId([u8; ITEM_ID_LEN]);

impl ItemId {
    /// Returns the creation timestamp embedded in the identifier.
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ItemId {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ITEM_ID_LEN * 2 {
            return Err(DbError::InvalidId(s.to_string()));
        }
        let mut bytes = [0u8; ITEM_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| DbError::InvalidId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Generates unique item identifiers for one store.
#[derive(Debug)]
pub struct IdGenerator {
    /// Per-process random component
    process_bytes: [u8; 5],
    /// Monotonic counter, seeded randomly
    counter: AtomicU32,
}

impl IdGenerator {
    /// Creates a generator with fresh random state.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            process_bytes: rng.gen(),
            counter: AtomicU32::new(rng.gen::<u32>() & COUNTER_MASK),
        }
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> ItemId {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; ITEM_ID_LEN];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process_bytes);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        ItemId(bytes)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A shopping list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned identifier
    pub id: ItemId,
    /// Display name
    pub name: String,
}

/// Mutable fields of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    /// Replacement name
    pub name: Option<String>,
}

impl ItemChanges {
    /// Changes that only rename the item.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Applies the changes to `item` in place.
    pub fn apply(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
    }
}

/// Checks that a name can be stored.
pub fn validate_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() {
        return Err(DbError::InvalidItem("name must not be empty".to_string()));
    }
    Ok(())
}
