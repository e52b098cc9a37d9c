//! No-op shared cache for deployments without Redis.

use super::service::{CacheResult, CacheService};
use crate::domain::entities::{RedirectRecord, ShortCode};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A shared cache implementation that does nothing.
///
/// Used when Redis is unavailable or not configured. Every lookup is a miss,
/// so the resolver falls through to the store after L1.
///
/// # Use Cases
///
/// - Development environments without Redis
/// - Fallback when the Redis connection fails at startup
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (shared tier disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get(&self, _code: &ShortCode) -> CacheResult<Option<RedirectRecord>> {
        Ok(None)
    }

    async fn put(&self, _record: &RedirectRecord, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
