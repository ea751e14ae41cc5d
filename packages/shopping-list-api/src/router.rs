//! Matchit routing configuration.

use std::fmt::Display;
use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use matchit::Router as MatchitRouter;

use crate::handlers;
use crate::handlers::request_utils::decode_path_id;
use shopping_list_core::{config::ServiceConfig, ItemStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Item store
    pub store: Arc<dyn ItemStore>,
    /// Service configuration
    pub config: Arc<ServiceConfig>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a new router with the items routes.
    pub fn new(store: Arc<dyn ItemStore>, config: Arc<ServiceConfig>) -> Self {
        let mut router = MatchitRouter::new();

        router
            .insert("/health", RouteHandler::Health)
            .expect("Failed to insert /health route");
        router
            .insert("/items", RouteHandler::Items)
            .expect("Failed to insert /items route");
        router
            .insert("/items/{id}", RouteHandler::Items)
            .expect("Failed to insert /items/{id} route");

        Self {
            inner: router,
            state: AppState { store, config },
        }
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// Handler errors are rendered into JSON error responses here, so the
    /// returned response is always ready to send.
    pub async fn route<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let path = req.uri().path().to_string();
        let method = req.method().clone();
        tracing::debug!("{} {}", method, path);

        // `/items/` is the same collection as `/items`.
        let lookup = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path.as_str(),
        };

        let result = match self.inner.at(lookup) {
            Ok(matched) => {
                let id = matched.params.get("id").map(decode_path_id);
                let handler = *matched.value;
                handler.handle(req, id, self.state.clone()).await
            }
            Err(_) => Err(RouterError::NotFound(format!("No route found for {}", path))),
        };

        match result {
            Ok(response) => response,
            Err(err) => {
                if let RouterError::InternalError(msg) = &err {
                    tracing::error!("{} {} failed: {}", method, path, msg);
                } else {
                    tracing::debug!("{} {} rejected: {}", method, path, err);
                }
                err.into()
            }
        }
    }
}

/// Route handler function.
#[derive(Debug, Clone, Copy)]
enum RouteHandler {
    Health,
    Items,
}

impl RouteHandler {
    /// Handles a request with the decoded `{id}` segment, if the route has one.
    async fn handle<B>(
        self,
        req: Request<B>,
        id: Option<String>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        match self {
            RouteHandler::Health => {
                if req.method() == Method::GET {
                    handlers::health(state).await
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
            RouteHandler::Items => match (req.method().clone(), id) {
                (Method::GET, None) => handlers::list_items(state).await,
                (Method::POST, None) => handlers::create_item(req, state).await,
                (Method::GET, Some(id)) => handlers::get_item(id, state).await,
                (Method::PUT, Some(id)) => handlers::update_item(id, req, state).await,
                (Method::DELETE, Some(id)) => handlers::delete_item(id, state).await,
                // Missing ids answer differently per method.
                (Method::PUT, None) => Err(RouterError::NotFound(
                    "PUT requires an item id in the path".to_string(),
                )),
                (Method::DELETE, None) => Err(RouterError::BadRequest(
                    "DELETE requires an item id in the path".to_string(),
                )),
                _ => Err(RouterError::MethodNotAllowed),
            },
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl RouterError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            RouterError::MethodNotAllowed => 405,
            RouterError::InternalError(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest(_) => 400,
            RouterError::NotFound(_) => 404,
        }
    }
}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let message = match &err {
            RouterError::MethodNotAllowed => "Method Not Allowed",
            RouterError::Timeout => "Request Timeout",
            RouterError::InternalError(_) => "Internal Server Error",
            RouterError::BadRequest(_) => "Bad Request",
            RouterError::NotFound(_) => "Not Found",
        };
        let details = match err {
            RouterError::InternalError(msg)
            | RouterError::BadRequest(msg)
            | RouterError::NotFound(msg) => Some(msg),
            RouterError::MethodNotAllowed | RouterError::Timeout => None,
        };

        let error_response = handlers::error_response(status, message.to_string(), details);
        let body = serde_json::to_vec(&error_response)
            .unwrap_or_else(|_| b"{\"success\":false}".to_vec());

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Bytes::from(body))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Bytes::from_static(b"Internal Server Error"));
                *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}
