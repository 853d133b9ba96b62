//! HTTP boundary.
//!
//! This module provides:
//! - the axum [`Router`] with CORS and request tracing
//! - shared application state
//! - graceful serving on a TCP listener

mod handlers;

pub use handlers::*;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::analysis::DecisionSimulator;
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};

/// Application state shared across handlers.
pub struct AppState {
    /// Validate/analyze/record pipeline.
    pub simulator: DecisionSimulator,
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(simulator: DecisionSimulator) -> Self {
        Self { simulator }
    }
}

/// Build the application router.
pub fn router(state: SharedState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/analyze-decision", post(handlers::analyze_decision))
        .layer(cors_layer(&server.cors_allow_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive CORS unless specific origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(parsed))
}

/// Bind the listener and serve until the process is stopped.
pub async fn serve(state: SharedState, server: &ServerConfig) -> AppResult<()> {
    let addr = server.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Failed to bind {}: {}", addr, e),
        })?;

    info!(%addr, "HTTP server listening");

    axum::serve(listener, router(state, server))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Server error: {}", e),
        })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
