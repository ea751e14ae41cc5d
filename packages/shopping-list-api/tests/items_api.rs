//! End-to-end tests for the `/items` endpoints, driven through the router.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http_body_util::Full;
use hyper::body::{Body, Bytes, Frame};
use hyper::Request;
use serde_json::{json, Value};
use tempfile::tempdir;

use shopping_list_api::router::Router;
use shopping_list_core::config::ServiceConfig;
use shopping_list_core::{DocumentFileStore, ItemStore, MemoryStore};

const UNKNOWN_ID: &str = "57d09c17ee09c21e3cd9ae6f";

struct TestResponse {
    status: u16,
    content_type: Option<String>,
    body: Bytes,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }
}

fn seeded_router() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    for name in ["Broad beans", "Tomatoes", "Peppers"] {
        store.create(name.to_string()).unwrap();
    }
    let router = Router::new(store.clone(), Arc::new(ServiceConfig::default()));
    (router, store)
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("Content-Type", "application/json");
    }
    let req = builder
        .body(Full::new(Bytes::from(body.unwrap_or("").to_string())))
        .unwrap();

    let response = router.route(req).await;
    TestResponse {
        status: response.status().as_u16(),
        content_type: response
            .headers()
            .get("Content-Type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: response.into_body(),
    }
}

#[tokio::test]
async fn test_list_items_on_get() {
    let (router, _store) = seeded_router();

    let res = send(&router, "GET", "/items", None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type.as_deref(), Some("application/json"));

    let body = res.json();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items[0]["id"].is_string());
    assert_eq!(items[0]["name"], "Broad beans");
    assert_eq!(items[1]["name"], "Tomatoes");
    assert_eq!(items[2]["name"], "Peppers");
}

#[tokio::test]
async fn test_create_update_delete_lifecycle() {
    let (router, store) = seeded_router();

    let res = send(&router, "POST", "/items", Some(r#"{"name": "Kale"}"#)).await;
    assert_eq!(res.status, 201);
    let created = res.json();
    assert_eq!(created["name"], "Kale");
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let body = json!({"name": "Durian", "id": id}).to_string();
    let res = send(&router, "PUT", &format!("/items/{}", id), Some(&body)).await;
    assert_eq!(res.status, 200);
    let updated = res.json();
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["name"], "Durian");

    let res = send(&router, "GET", &format!("/items/{}", id), None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json()["name"], "Durian");

    let body = json!({"id": id}).to_string();
    let res = send(&router, "DELETE", &format!("/items/{}", id), Some(&body)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json()["name"], "Durian");

    let res = send(&router, "GET", "/items", None).await;
    let listed = res.json();
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .all(|item| item["id"] != id.as_str()));
    assert_eq!(store.len().unwrap(), 3);
}

#[tokio::test]
async fn test_post_without_body() {
    let (router, store) = seeded_router();
    let res = send(&router, "POST", "/items", None).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.json()["success"], false);
    assert_eq!(res.json()["error"]["code"], "400");
    assert_eq!(store.len().unwrap(), 3);
}

#[tokio::test]
async fn test_post_with_invalid_json() {
    let (router, _store) = seeded_router();
    let res = send(&router, "POST", "/items", Some("Not a valid json")).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_post_with_bad_name() {
    let (router, store) = seeded_router();
    for body in ["null", "{}", r#"{"name": 5}"#, r#"{"name": ""}"#, "[]"] {
        let res = send(&router, "POST", "/items", Some(body)).await;
        assert_eq!(res.status, 400, "body {body:?} should be rejected");
    }
    assert_eq!(store.len().unwrap(), 3);
}

#[tokio::test]
async fn test_put_without_id_in_path() {
    let (router, _store) = seeded_router();
    let res = send(&router, "PUT", "/items", Some(r#"{"name": "Durian", "id": 3}"#)).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_put_with_mismatched_ids() {
    let (router, _store) = seeded_router();
    let res = send(&router, "PUT", "/items/16", Some(r#"{"name": "Apples", "id": 5}"#)).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_put_without_body_id() {
    let (router, store) = seeded_router();
    let id = store.list().unwrap()[0].id.to_string();
    let res = send(
        &router,
        "PUT",
        &format!("/items/{}", id),
        Some(r#"{"name": "Apples"}"#),
    )
    .await;
    assert_eq!(res.status, 400);
    assert_eq!(store.list().unwrap()[0].name, "Broad beans");
}

#[tokio::test]
async fn test_put_with_malformed_matching_id() {
    let (router, _store) = seeded_router();
    let res = send(&router, "PUT", "/items/16", Some(r#"{"name": "Apples", "id": 16}"#)).await;
    assert_eq!(res.status, 400);
}

// Current behavior: unknown ids are a silent no-op on update but a 400 on delete.
#[tokio::test]
async fn test_put_to_unknown_id() {
    let (router, store) = seeded_router();
    let before = store.list().unwrap();

    let body = json!({"name": "Apples", "id": UNKNOWN_ID}).to_string();
    let res = send(&router, "PUT", &format!("/items/{}", UNKNOWN_ID), Some(&body)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type.as_deref(), Some("application/json"));
    assert_eq!(res.json(), Value::Null);
    assert_eq!(store.list().unwrap(), before);
}

#[tokio::test]
async fn test_put_without_body() {
    let (router, _store) = seeded_router();
    let res = send(&router, "PUT", "/items/56", None).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_put_with_invalid_json() {
    let (router, _store) = seeded_router();
    let res = send(&router, "PUT", "/items/100", Some("not a valid JSON")).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_delete_malformed_id() {
    let (router, store) = seeded_router();
    let res = send(&router, "DELETE", "/items/20", Some(r#"{"id": 20}"#)).await;
    assert_eq!(res.status, 400);
    assert_eq!(store.len().unwrap(), 3);
}

#[tokio::test]
async fn test_delete_unknown_id() {
    let (router, store) = seeded_router();
    let res = send(&router, "DELETE", &format!("/items/{}", UNKNOWN_ID), None).await;
    assert_eq!(res.status, 400);
    assert_eq!(store.len().unwrap(), 3);
}

#[tokio::test]
async fn test_delete_without_id_in_path() {
    let (router, _store) = seeded_router();
    let res = send(&router, "DELETE", "/items", Some(r#"{"id": 1}"#)).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_trailing_slash_without_id() {
    let (router, store) = seeded_router();

    let res = send(&router, "DELETE", "/items/", Some(r#"{"id": 1}"#)).await;
    assert_eq!(res.status, 400);
    let res = send(&router, "PUT", "/items/", Some(r#"{"name": "Durian", "id": 3}"#)).await;
    assert_eq!(res.status, 404);

    let res = send(&router, "GET", "/items/", None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json().as_array().unwrap().len(), 3);
    assert_eq!(store.len().unwrap(), 3);
}

/// Request body that never yields a frame.
struct StalledBody;

impl Body for StalledBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Pending
    }
}

#[tokio::test]
async fn test_stalled_body_times_out() {
    let store = Arc::new(MemoryStore::new());
    let config = ServiceConfig {
        request_timeout_ms: 50,
        ..Default::default()
    };
    let router = Router::new(store.clone(), Arc::new(config));

    let req = Request::builder()
        .method("POST")
        .uri("/items")
        .body(StalledBody)
        .unwrap();
    let response = router.route(req).await;

    assert_eq!(response.status().as_u16(), 408);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"]["code"], "408");
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_get_single_item_errors() {
    let (router, _store) = seeded_router();
    let res = send(&router, "GET", &format!("/items/{}", UNKNOWN_ID), None).await;
    assert_eq!(res.status, 404);
    let res = send(&router, "GET", "/items/not-an-id", None).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_unknown_route_and_method() {
    let (router, _store) = seeded_router();

    let res = send(&router, "GET", "/lists", None).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.json()["error"]["message"], "Not Found");

    let res = send(&router, "PATCH", "/items", Some("{}")).await;
    assert_eq!(res.status, 405);
    let res = send(&router, "POST", "/items/16", Some(r#"{"name": "Kale"}"#)).await;
    assert_eq!(res.status, 405);
}

#[tokio::test]
async fn test_health() {
    let (router, _store) = seeded_router();
    let res = send(&router, "GET", "/health", None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json(), json!({"status": "ok", "items": 3}));
}

#[tokio::test]
async fn test_document_store_backs_router() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("items.json");
    let config = Arc::new(ServiceConfig::default());

    let id = {
        let store = Arc::new(DocumentFileStore::open(&path, 3, 0).unwrap());
        let router = Router::new(store, config.clone());
        let res = send(&router, "POST", "/items", Some(r#"{"name": "Kale"}"#)).await;
        assert_eq!(res.status, 201);
        res.json()["id"].as_str().unwrap().to_string()
    };

    let store = Arc::new(DocumentFileStore::open(&path, 3, 0).unwrap());
    let router = Router::new(store, config);
    let res = send(&router, "GET", "/items", None).await;
    assert_eq!(res.json(), json!([{"id": id, "name": "Kale"}]));
}
