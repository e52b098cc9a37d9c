//! Shared-tier backend trait and error types.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::entities::{RedirectRecord, ShortCode};

/// Errors that can occur during shared cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
    #[error("Cache payload could not be decoded: {0}")]
    DecodeError(String),
    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Network-reachable backend for the shared (L2) tier.
///
/// Implementations report failures honestly; the
/// [`crate::infrastructure::cache::SharedCache`] wrapper is what turns an
/// error or a timeout into a miss, so the read path never sees it.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the record cached under a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` on cache hit
    /// - `Ok(None)` on cache miss
    async fn get(&self, code: &ShortCode) -> CacheResult<Option<RedirectRecord>>;

    /// Stores a record with the given TTL, overwriting any previous value.
    async fn put(&self, record: &RedirectRecord, ttl: Duration) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by health check endpoints to report cache status.
    async fn health_check(&self) -> bool;
}
