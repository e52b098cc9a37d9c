//! DTOs for health check endpoint.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::metrics::TierSnapshot;

/// Health check response with component status and tier counters.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
    pub tiers: BTreeMap<&'static str, TierStats>,
}

/// Health status for each external component.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub shared_cache: CheckStatus,
}

/// Individual component health status.
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Counters for one cache tier.
#[derive(Debug, Serialize)]
pub struct TierStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub puts: u64,
    pub estimated_size: u64,
}

impl From<TierSnapshot> for TierStats {
    fn from(s: TierSnapshot) -> Self {
        Self {
            hits: s.hits,
            misses: s.misses,
            evictions: s.evictions,
            puts: s.puts,
            estimated_size: s.estimated_size,
        }
    }
}
