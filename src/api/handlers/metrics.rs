//! Handler for Prometheus scraping.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Renders all recorded metrics in Prometheus text format.
///
/// # Endpoint
///
/// `GET /metrics`
///
/// Returns 404 when no recorder was installed (e.g. in tests).
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.resolver.refresh_tier_sizes();
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(StatusCode::NOT_FOUND)
}
