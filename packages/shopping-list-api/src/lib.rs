//! REST API server for the shopping list.
//!
//! Provides the `/items` endpoints, request routing and the hyper
//! connection loop.

pub mod handlers;
pub mod router;
pub mod server;
