//! HTTP transport.
//!
//! Axum router exposing the analysis as `POST /api`, with an open CORS
//! policy and JSON error bodies.

pub mod error;
pub mod handlers;

use anyhow::{Context, Result};
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::store::TelemetryStore;

/// Shared request state.
///
/// The store is loaded once before the server starts and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TelemetryStore>,
    /// Threshold for requests that omit `threshold_ms`.
    pub default_threshold_ms: i64,
}

impl AppState {
    pub fn new(store: Arc<TelemetryStore>, default_threshold_ms: i64) -> Self {
        Self {
            store,
            default_threshold_ms,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/api",
            post(handlers::analyze).fallback(handlers::method_not_allowed),
        )
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;

    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
