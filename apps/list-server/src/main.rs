//! Shopping list REST API server.
//!
//! Opens the item store named by the database URL, wires the router
//! and serves HTTP until Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use shopping_list_api::{router::Router, server::Server};
use shopping_list_core::{config::ServiceConfig, open_store};
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the shopping list server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Item store location: `memory`, `file://<path>` or a bare path
    #[arg(long, env = "DATABASE_URL", default_value = "memory://")]
    database_url: String,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Retry attempts for transient store I/O errors
    #[arg(long, default_value_t = 3)]
    persistence_max_retries: u32,
}

impl Args {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            database_url: self.database_url.clone(),
            request_timeout_ms: self.request_timeout_ms,
            persistence_max_retries: self.persistence_max_retries,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(args.service_config());
    let store = open_store(&config)
        .with_context(|| format!("Failed to open item store '{}'", config.database_url))?;

    let router = Router::new(store, config.clone());
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid listen address")?;
    let server = Server::new(addr, router);

    tracing::info!(
        "Starting shopping list server on {} (store: {}, request timeout: {} ms)",
        addr,
        config.database_url,
        config.request_timeout_ms
    );

    tokio::select! {
        result = server.serve() => {
            result.context("Server error")?;
        }
        result = signal::ctrl_c() => {
            result.context("Failed to listen for ctrl_c")?;
            tracing::info!("Shutting down server");
        }
    }

    Ok(())
}
