//! Request utilities for HTTP endpoints.

use std::fmt::Display;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time;

use crate::router::{AppState, RouterError};
use shopping_list_core::error::DbError;
use shopping_list_core::{ItemId, ItemStore};

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout<B>(
    req: Request<B>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Display,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.into_body().collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::BadRequest(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Parses a JSON request body, rejecting empty bodies.
pub fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, RouterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RouterError::BadRequest("Request body is required".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|e| RouterError::BadRequest(format!("Failed to parse request: {}", e)))
}

/// Decodes the raw `{id}` path segment.
pub fn decode_path_id(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Parses an item identifier taken from the path.
pub fn parse_item_id(raw: &str) -> Result<ItemId, RouterError> {
    raw.parse().map_err(map_db_error_to_router_error)
}

/// Whether the `id` carried in a request body names the same item as the path.
///
/// Strings must match exactly; numbers match their decimal rendering.
pub fn body_id_matches(body_id: &serde_json::Value, path_id: &str) -> bool {
    match body_id {
        serde_json::Value::String(s) => s == path_id,
        serde_json::Value::Number(n) => n.to_string() == path_id,
        _ => false,
    }
}

/// Map DbError to appropriate RouterError
pub fn map_db_error_to_router_error(e: DbError) -> RouterError {
    match e {
        DbError::InvalidId(_) | DbError::InvalidItem(_) | DbError::ItemNotFound { .. } => {
            RouterError::BadRequest(e.to_string())
        }
        _ => RouterError::InternalError(format!("Store error: {}", e)),
    }
}

/// Runs a store operation on the blocking pool.
pub async fn run_store_op<T, F>(state: &AppState, op: F) -> Result<T, RouterError>
where
    F: FnOnce(&dyn ItemStore) -> Result<T, DbError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| RouterError::InternalError(format!("Store task failed: {}", e)))?
        .map_err(map_db_error_to_router_error)
}

/// Request to create an item.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    /// Item name
    pub name: String,
}

/// Request to update an item.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// Must name the same item as the path
    pub id: Option<serde_json::Value>,
    /// Replacement name
    pub name: Option<String>,
}

/// Response from the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: &'static str,
    /// Number of stored items
    pub items: usize,
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Serializes `value` and builds a JSON response.
pub fn json_response<T: Serialize>(status: u16, value: &T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(status, json)
}
