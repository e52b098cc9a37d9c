//! Shared L2 tier with fail-open semantics.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::service::{CacheError, CacheService};
use crate::domain::entities::{RedirectRecord, ShortCode};
use crate::metrics::{CacheMetrics, Tier};

/// The L2 tier as seen by the resolver and the coherence subscriber.
///
/// Wraps a [`CacheService`] backend with a per-request timeout and the tier's
/// own TTL. A failed or slow backend is indistinguishable from a miss here:
/// `get` yields `None` and `put` is skipped, both logged at `warn`.
///
/// The backend can be swapped at runtime, e.g. once Redis becomes reachable
/// after starting on [`NullCache`](super::NullCache).
pub struct SharedCache {
    backend: RwLock<Arc<dyn CacheService>>,
    ttl: Duration,
    request_timeout: Duration,
    metrics: Arc<CacheMetrics>,
}

impl SharedCache {
    pub fn new(
        backend: Arc<dyn CacheService>,
        ttl: Duration,
        request_timeout: Duration,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            backend: RwLock::new(backend),
            ttl,
            request_timeout,
            metrics,
        }
    }

    /// Routes later requests to `backend`.
    pub fn replace_backend(&self, backend: Arc<dyn CacheService>) {
        *self.backend.write() = backend;
        info!(tier = "L2", "shared cache backend replaced");
    }

    fn backend(&self) -> Arc<dyn CacheService> {
        self.backend.read().clone()
    }

    pub async fn get(&self, code: &ShortCode) -> Option<RedirectRecord> {
        let backend = self.backend();
        let result = match timeout(self.request_timeout, backend.get(code)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.request_timeout)),
        };

        match result {
            Ok(Some(record)) => {
                debug!(short_code = %code, tier = "L2", "cache hit");
                self.metrics.record_hit(Tier::L2);
                Some(record)
            }
            Ok(None) => {
                self.metrics.record_miss(Tier::L2);
                None
            }
            Err(e) => {
                warn!(short_code = %code, tier = "L2", error = %e, "shared cache unavailable, treating as miss");
                self.metrics.record_miss(Tier::L2);
                None
            }
        }
    }

    /// Writes `record` with the L2 TTL. Failures are logged and swallowed.
    pub async fn put(&self, record: &RedirectRecord) {
        let backend = self.backend();
        let result = match timeout(self.request_timeout, backend.put(record, self.ttl)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.request_timeout)),
        };

        match result {
            Ok(()) => {
                debug!(short_code = %record.short_code, tier = "L2", "cache put");
                self.metrics.record_put(Tier::L2);
            }
            Err(e) => {
                warn!(short_code = %record.short_code, tier = "L2", error = %e, "shared cache put skipped");
            }
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn health_check(&self) -> bool {
        let backend = self.backend();
        timeout(self.request_timeout, backend.health_check())
            .await
            .unwrap_or(false)
    }
}
