//! In-process L1 tier.

use moka::notification::RemovalCause;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::domain::entities::{CacheEntry, RedirectRecord, ShortCode};
use crate::metrics::{CacheMetrics, Tier};

/// Capacity- and TTL-bounded cache owned by a single process.
///
/// Backed by `moka::sync::Cache`, so `get` and `put` are synchronous, never
/// touch the network and are safe to call from any number of tasks at once.
/// Entries expire `ttl` after insertion regardless of how long the record
/// had left in L2.
pub struct LocalCache {
    inner: Cache<ShortCode, CacheEntry>,
    ttl: Duration,
    metrics: Arc<CacheMetrics>,
}

impl LocalCache {
    /// Creates an L1 cache holding at most `capacity` entries for `ttl` each.
    pub fn new(capacity: u64, ttl: Duration, metrics: Arc<CacheMetrics>) -> Self {
        let listener_metrics = metrics.clone();

        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .eviction_listener(move |_key, _entry, cause: RemovalCause| {
                if cause.was_evicted() {
                    listener_metrics.record_eviction(Tier::L1);
                }
            })
            .build();

        Self {
            inner,
            ttl,
            metrics,
        }
    }

    pub fn get(&self, code: &ShortCode) -> Option<RedirectRecord> {
        match self.inner.get(code) {
            Some(entry) => {
                debug!(short_code = %code, tier = "L1", "cache hit");
                self.metrics.record_hit(Tier::L1);
                Some(entry.value)
            }
            None => {
                self.metrics.record_miss(Tier::L1);
                None
            }
        }
    }

    /// Stores an owned copy of `record` under its short code.
    pub fn put(&self, record: RedirectRecord) {
        let entry = CacheEntry::new(record, self.ttl);
        debug!(short_code = %entry.key, tier = "L1", "cache put");

        self.inner.insert(entry.key.clone(), entry);
        self.metrics.record_put(Tier::L1);
        self.metrics
            .set_estimated_size(Tier::L1, self.inner.entry_count());
    }

    /// Returns the full entry, including insertion and expiry times, without
    /// counting a hit or miss.
    pub fn entry(&self, code: &ShortCode) -> Option<CacheEntry> {
        self.inner.get(code)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Applies pending evictions and expirations, then refreshes the size
    /// gauge. Expirations alone never touch the gauge until this runs.
    pub fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks();
        self.metrics
            .set_estimated_size(Tier::L1, self.inner.entry_count());
    }
}
