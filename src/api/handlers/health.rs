//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, TierStats};
use crate::metrics::Tier;
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: Shared cache reachable
/// - **503 Service Unavailable**: Shared cache down (reads still succeed via the store)
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": { "shared_cache": { "status": "ok" } },
///   "tiers": {
///     "L1": { "hits": 10, "misses": 2, "evictions": 0, "puts": 2, "estimated_size": 2 },
///     "L2": { "hits": 1, "misses": 1, "evictions": 0, "puts": 1, "estimated_size": 0 }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let cache_check = if state.shared_cache.health_check().await {
        CheckStatus {
            status: "ok".to_string(),
            message: None,
        }
    } else {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Shared cache unreachable, serving from L1 and store".to_string()),
        }
    };

    let healthy = cache_check.status == "ok";
    state.resolver.refresh_tier_sizes();
    let metrics = state.resolver.metrics();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            shared_cache: cache_check,
        },
        tiers: [Tier::L1, Tier::L2]
            .into_iter()
            .map(|tier| (tier.as_str(), TierStats::from(metrics.snapshot(tier))))
            .collect(),
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
