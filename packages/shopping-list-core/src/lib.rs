//! Core storage layer for the shopping list service.
//!
//! Provides the item model, identifier generation, service
//! configuration, and the storage adapters behind the `ItemStore` trait.

pub mod config;
pub mod error;
pub mod item;
pub mod store;

pub use item::{Item, ItemChanges, ItemId};
pub use store::{open_store, DocumentFileStore, ItemStore, MemoryStore, StoreUrl};
