//! Tiered get-or-load for redirect records.

use std::sync::Arc;
use tracing::{debug, error};

use crate::application::services::stampede_guard::{GuardError, StampedeGuard};
use crate::domain::entities::{RedirectRecord, ShortCode};
use crate::domain::repositories::{RedirectStore, StoreError};
use crate::infrastructure::cache::{LocalCache, SharedCache};
use crate::metrics::CacheMetrics;

/// Outcome of a single resolve.
///
/// Expected outcomes are plain variants; only store failures carry a cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(RedirectRecord),
    NotFound,
    LockAcquisitionFailed,
    ResolutionFailed(StoreError),
}

/// Error form of the non-`Found` resolutions, for `?`-style callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("short code {0} not found")]
    NotFound(ShortCode),
    #[error("lock for short code {0} could not be acquired")]
    LockAcquisitionFailed(ShortCode),
    #[error("store query for short code {code} failed")]
    StoreQueryFailed {
        code: ShortCode,
        #[source]
        source: StoreError,
    },
}

impl Resolution {
    /// Converts into a `Result`, naming `code` in the error.
    pub fn into_result(self, code: &ShortCode) -> Result<RedirectRecord, ResolveError> {
        match self {
            Resolution::Found(record) => Ok(record),
            Resolution::NotFound => Err(ResolveError::NotFound(code.clone())),
            Resolution::LockAcquisitionFailed => {
                Err(ResolveError::LockAcquisitionFailed(code.clone()))
            }
            Resolution::ResolutionFailed(source) => Err(ResolveError::StoreQueryFailed {
                code: code.clone(),
                source,
            }),
        }
    }
}

/// Resolves short codes through L1, L2 and, under the stampede guard, the store.
///
/// # Read Path
///
/// 1. **L1 hit**: returned immediately, no I/O
/// 2. **L2 hit**: promoted into L1 with L1's own TTL
/// 3. **Both miss**: under the guard, L2 is checked again (a concurrent
///    winner may have filled it while we waited), then the store is queried.
///    A found record is written to L2 first, then L1. Callers still waiting
///    for the lock re-check L1 and L2 between attempts and return as soon
///    as the winner's write lands.
///
/// Not-found results and store failures are never cached. L2 failures are
/// misses and never reach the caller.
pub struct RedirectResolver {
    local: Arc<LocalCache>,
    shared: Arc<SharedCache>,
    guard: StampedeGuard,
    store: Arc<dyn RedirectStore>,
    metrics: Arc<CacheMetrics>,
}

impl RedirectResolver {
    /// Creates a new resolver.
    pub fn new(
        local: Arc<LocalCache>,
        shared: Arc<SharedCache>,
        guard: StampedeGuard,
        store: Arc<dyn RedirectStore>,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            local,
            shared,
            guard,
            store,
            metrics,
        }
    }

    pub async fn resolve(&self, code: &ShortCode) -> Resolution {
        if let Some(record) = self.local.get(code) {
            return Resolution::Found(record);
        }

        if let Some(record) = self.shared.get(code).await {
            self.local.put(record.clone());
            return Resolution::Found(record);
        }

        match self
            .guard
            .execute(
                code.as_str(),
                || self.published(code),
                || self.load_cold(code),
            )
            .await
        {
            Ok(resolution) => resolution,
            Err(GuardError::LockAcquisitionFailed { .. }) => Resolution::LockAcquisitionFailed,
        }
    }

    /// Writes a known record into L2 then L1.
    ///
    /// Idempotent: records are immutable, so rewriting one stores the same value.
    pub async fn warm(&self, record: RedirectRecord) {
        warm_tiers(&self.local, &self.shared, record).await;
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn guard(&self) -> &StampedeGuard {
        &self.guard
    }

    /// Applies pending L1 expirations so the size gauge is current.
    pub fn refresh_tier_sizes(&self) {
        self.local.run_pending_tasks();
    }

    /// A record another caller has written since this one missed.
    async fn published(&self, code: &ShortCode) -> Option<Resolution> {
        if let Some(entry) = self.local.entry(code) {
            return Some(Resolution::Found(entry.value));
        }

        let record = self.shared.get(code).await?;
        self.local.put(record.clone());
        Some(Resolution::Found(record))
    }

    async fn load_cold(&self, code: &ShortCode) -> Resolution {
        if let Some(record) = self.shared.get(code).await {
            debug!(short_code = %code, "filled by a concurrent loader while waiting");
            self.local.put(record.clone());
            return Resolution::Found(record);
        }

        self.metrics.record_store_query();
        match self.store.find_by_short_code(code).await {
            Ok(Some(record)) => {
                debug!(short_code = %code, "loaded from store");
                warm_tiers(&self.local, &self.shared, record.clone()).await;
                Resolution::Found(record)
            }
            Ok(None) => {
                debug!(short_code = %code, "short code not found in store");
                Resolution::NotFound
            }
            Err(e) => {
                error!(short_code = %code, error = %e, "store query failed");
                Resolution::ResolutionFailed(e)
            }
        }
    }
}

/// L2 first, since it is the tier other instances observe.
pub(crate) async fn warm_tiers(local: &LocalCache, shared: &SharedCache, record: RedirectRecord) {
    shared.put(&record).await;
    local.put(record);
}
