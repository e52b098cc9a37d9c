//! Cache tiers for redirect lookups.
//!
//! - [`LocalCache`] - In-process L1 tier (moka), synchronous and bounded
//! - [`SharedCache`] - L2 tier wrapper that degrades backend failures to misses
//! - [`CacheService`] - Backend trait for the shared tier, with two implementations:
//!   - [`RedisCache`] - Production Redis-backed cache
//!   - [`NullCache`] - No-op implementation for disabled caching

mod local_cache;
mod null_cache;
mod redis_cache;
mod service;
mod shared_cache;

pub use local_cache::LocalCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};
pub use shared_cache::SharedCache;

#[cfg(test)]
pub use service::MockCacheService;

use std::time::Duration;

/// Capacity, TTL and timeout settings for both tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub l1_capacity: u64,
    pub l1_ttl: Duration,
    pub l2_ttl: Duration,
    pub l2_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            l1_capacity: 100_000,
            l1_ttl: Duration::from_secs(600),
            l2_ttl: Duration::from_secs(6 * 3600),
            l2_timeout: Duration::from_millis(250),
        }
    }
}
