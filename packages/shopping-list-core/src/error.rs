//! Storage error types.

use thiserror::Error;

/// Item store operation errors.
#[derive(Error, Debug, Clone)]
pub enum DbError {
    /// Identifier is not a 24 digit hexadecimal string
    #[error("Invalid item id '{0}'")]
    InvalidId(String),

    /// Item not found
    #[error("Item '{id}' not found")]
    ItemNotFound { id: String },

    /// Item fields failed validation
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Unsupported or malformed database URL
    #[error("Invalid database URL '{0}'")]
    InvalidUrl(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}
