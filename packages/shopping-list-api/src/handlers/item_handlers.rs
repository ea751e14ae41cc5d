//! Items collection handlers.

use std::fmt::Display;

use hyper::body::{Body, Bytes};
use hyper::{Request, Response};

use crate::router::{AppState, RouterError};
use shopping_list_core::ItemChanges;

use super::request_utils::{
    body_id_matches, build_response, json_response, parse_item_id, parse_json_body,
    read_request_body_with_timeout, run_store_op, CreateItemRequest, HealthResponse,
    UpdateItemRequest,
};

/// Lists all items.
///
/// # Endpoint
/// `GET /items`
///
/// # Response
/// - **200 OK**: Array of items in insertion order
/// ```json
/// [{"id": "57d09c17ee09c21e3cd9ae6f", "name": "Broad beans"}]
/// ```
pub async fn list_items(state: AppState) -> Result<Response<Bytes>, RouterError> {
    let items = run_store_op(&state, |store| store.list()).await?;
    json_response(200, &items)
}

/// Creates a new item.
///
/// # Endpoint
/// `POST /items`
///
/// # Request Body
/// ```json
/// {"name": "Kale"}
/// ```
///
/// # Response
/// - **201 Created**: The stored item with its generated id
///
/// # Errors
/// - **400 Bad Request**: Missing or unparsable body, or missing/empty `name`
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:8080/items \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Kale"}'
/// ```
pub async fn create_item<B>(req: Request<B>, state: AppState) -> Result<Response<Bytes>, RouterError>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Display,
{
    let body_bytes = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let request: CreateItemRequest = parse_json_body(&body_bytes)?;

    let item = run_store_op(&state, move |store| store.create(request.name)).await?;
    tracing::info!("Created item {} ({})", item.id, item.name);

    json_response(201, &item)
}

/// Fetches a single item.
///
/// # Endpoint
/// `GET /items/{id}`
///
/// # Errors
/// - **400 Bad Request**: Malformed id
/// - **404 Not Found**: No item with this id
pub async fn get_item(id: String, state: AppState) -> Result<Response<Bytes>, RouterError> {
    let item_id = parse_item_id(&id)?;
    match run_store_op(&state, move |store| store.find_by_id(&item_id)).await? {
        Some(item) => json_response(200, &item),
        None => Err(RouterError::NotFound(format!("Item '{}' not found", id))),
    }
}

/// Renames an item.
///
/// # Endpoint
/// `PUT /items/{id}`
///
/// # Request Body
/// ```json
/// {"id": "57d09c17ee09c21e3cd9ae6f", "name": "Durian"}
/// ```
///
/// # Response
/// - **200 OK**: The updated item, or `null` when no item has this id
///
/// # Errors
/// - **400 Bad Request**: Missing or unparsable body, body `id` differs from
///   the path, missing/empty `name`, or malformed id
///
/// # Notes
/// - Unknown ids are a silent no-op, unlike `DELETE` which rejects them
pub async fn update_item<B>(
    id: String,
    req: Request<B>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Display,
{
    let body_bytes = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let request: UpdateItemRequest = parse_json_body(&body_bytes)?;

    match &request.id {
        Some(body_id) if body_id_matches(body_id, &id) => {}
        Some(body_id) => {
            return Err(RouterError::BadRequest(format!(
                "Body id {} does not match path id '{}'",
                body_id, id
            )))
        }
        None => return Err(RouterError::BadRequest("Body id is required".to_string())),
    }
    let name = request
        .name
        .ok_or_else(|| RouterError::BadRequest("Body name is required".to_string()))?;
    let item_id = parse_item_id(&id)?;

    let updated = run_store_op(&state, move |store| {
        store.update_by_id(&item_id, ItemChanges::rename(name))
    })
    .await?;

    match updated {
        Some(item) => {
            tracing::info!("Updated item {} ({})", item.id, item.name);
            json_response(200, &item)
        }
        None => {
            tracing::debug!("Update of unknown item {} ignored", item_id);
            build_response(200, b"null".to_vec())
        }
    }
}

/// Deletes an item.
///
/// # Endpoint
/// `DELETE /items/{id}`
///
/// # Response
/// - **200 OK**: The removed item
///
/// # Errors
/// - **400 Bad Request**: Malformed id or no item with this id
///
/// # Notes
/// - Any request body is ignored
pub async fn delete_item(id: String, state: AppState) -> Result<Response<Bytes>, RouterError> {
    let item_id = parse_item_id(&id)?;
    let removed = run_store_op(&state, move |store| store.delete_by_id(&item_id)).await?;
    tracing::info!("Deleted item {} ({})", removed.id, removed.name);
    json_response(200, &removed)
}

/// Liveness probe.
///
/// # Endpoint
/// `GET /health`
pub async fn health(state: AppState) -> Result<Response<Bytes>, RouterError> {
    let items = run_store_op(&state, |store| store.len()).await?;
    json_response(
        200,
        &HealthResponse {
            status: "ok",
            items,
        },
    )
}
