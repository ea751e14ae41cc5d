//! HTTP endpoint implementations for the items collection.

mod item_handlers;
pub mod request_utils;
mod response;

pub use item_handlers::{create_item, delete_item, get_item, health, list_items, update_item};
pub use response::{error_response, ApiError, ErrorResponse};
