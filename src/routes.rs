//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`   - Short link redirect
//! - `GET  /health`   - Shared cache check and per-tier counters
//! - `GET  /metrics`  - Prometheus scrape endpoint
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api::handlers::{health_handler, metrics_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/{code}", get(redirect_handler))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
