//! # mockapi server
//!
//! Request-fixture server for HTTP and GraphQL integration tests:
//! - Answers any request from a persisted fixture chosen by method, path and query string
//! - JSON, static, binary, templated and self-describing fixtures
//! - Call-counted expectations that take precedence over fixtures
//! - GraphQL fixtures keyed by operation name and whitespace-insensitive query
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mockapi_server::{ServerConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     serve(ServerConfig::with_data_dir("./mockData")).await
//! }
//! ```
//!
//! Tests then declare fixtures over HTTP:
//!
//! ```text
//! POST /fixtures                      {"httpMethod":"GET","requestPath":"api/Sample","expectedResult":{"Id":"x"}}
//! GET  /api/Sample                    -> {"Id":"x"}
//! POST /fixtures/expect-setup         {"httpMethod":"POST","requestPath":"api/Order","expectedResult":{}}
//! GET  /fixtures/expect/1/POST?path=api/Order
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

use anyhow::Context;
use axum::Router;
use mockapi_store::{ExpectationRegistry, FixtureStore};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::info;

// Re-export commonly used types
pub use config::{ConfigOverrides, ServerConfig};
pub use error::{ApiError, ConfigError, Result};
pub use resolver::{RequestDescriptor, RequestResolver, Resolution, ResolutionSource};

// Module declarations
pub mod config;
pub mod error;
pub mod observability;
pub mod resolver;
pub mod routes;

/// Server version, automatically updated from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// State shared by every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Resolver over the fixture store and expectation registry
    pub resolver: RequestResolver,

    /// Directory serving the home page
    pub web_root: Option<PathBuf>,
}

impl AppState {
    /// Create state over a store with an empty expectation registry
    pub fn new(store: FixtureStore) -> Self {
        Self {
            resolver: RequestResolver::new(store, Arc::new(ExpectationRegistry::new())),
            web_root: None,
        }
    }

    /// Serve the home page from `web_root`
    #[must_use]
    pub fn with_web_root(mut self, web_root: Option<PathBuf>) -> Self {
        self.web_root = web_root;
        self
    }
}

/// Build the application router with request tracing
pub fn app(state: AppState) -> Router {
    routes::router(state).layer(ServiceBuilder::new().layer(observability::http_trace_layer()))
}

/// Serve `state` on `listener` until `shutdown` completes
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Validate `config`, open the data directory and serve until Ctrl-C
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the data directory
/// cannot be opened or the listen address cannot be bound.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let store = FixtureStore::open_dir(&config.data_dir)
        .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;
    let state = AppState::new(store).with_web_root(config.web_root.clone());

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(
        bind = %config.bind,
        data_dir = %config.data_dir.display(),
        version = VERSION,
        "mockapi listening"
    );

    serve_with_shutdown(listener, state, shutdown_signal()).await?;
    info!("mockapi stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_serve_rejects_missing_data_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig::with_data_dir(temp_dir.path().join("missing"));
        let err = serve(config).await.unwrap_err();
        assert!(err.to_string().contains("Data directory does not exist"));
    }
}
