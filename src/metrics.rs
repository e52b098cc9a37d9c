//! Per-tier cache metrics.
//!
//! [`CacheMetrics`] is an explicitly constructed observer shared by the tiers,
//! the stampede guard and the resolver. Every recording updates an in-process
//! counter (readable through [`CacheMetrics::snapshot`]) and is forwarded to
//! the `metrics` facade with a `tier` label so an installed exporter can
//! scrape it.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "redirect_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "redirect_cache_misses_total";
    pub const CACHE_EVICTIONS_TOTAL: &str = "redirect_cache_evictions_total";
    pub const CACHE_PUTS_TOTAL: &str = "redirect_cache_puts_total";
    pub const CACHE_ENTRIES: &str = "redirect_cache_entries";

    pub const STORE_QUERIES_TOTAL: &str = "redirect_store_queries_total";
    pub const LOCK_TIMEOUTS_TOTAL: &str = "redirect_lock_timeouts_total";
}

/// A level of the cache hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    L1,
    L2,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::L1 => "L1",
            Tier::L2 => "L2",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
struct TierCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    puts: AtomicU64,
    estimated_size: AtomicU64,
}

/// Point-in-time view of one tier's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub puts: u64,
    pub estimated_size: u64,
}

/// Hit/miss/eviction/put counters and estimated size, per tier.
#[derive(Default)]
pub struct CacheMetrics {
    l1: TierCounters,
    l2: TierCounters,
    store_queries: AtomicU64,
    lock_timeouts: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn tier(&self, tier: Tier) -> &TierCounters {
        match tier {
            Tier::L1 => &self.l1,
            Tier::L2 => &self.l2,
        }
    }

    pub fn record_hit(&self, tier: Tier) {
        self.tier(tier).hits.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_HITS_TOTAL, "tier" => tier.as_str()).increment(1);
    }

    pub fn record_miss(&self, tier: Tier) {
        self.tier(tier).misses.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_MISSES_TOTAL, "tier" => tier.as_str()).increment(1);
    }

    pub fn record_eviction(&self, tier: Tier) {
        self.tier(tier).evictions.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_EVICTIONS_TOTAL, "tier" => tier.as_str()).increment(1);
    }

    pub fn record_put(&self, tier: Tier) {
        self.tier(tier).puts.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_PUTS_TOTAL, "tier" => tier.as_str()).increment(1);
    }

    /// Records the tier's current approximate entry count.
    pub fn set_estimated_size(&self, tier: Tier, entries: u64) {
        self.tier(tier)
            .estimated_size
            .store(entries, Ordering::Relaxed);
        gauge!(names::CACHE_ENTRIES, "tier" => tier.as_str()).set(entries as f64);
    }

    /// Counts a query issued against the backing store.
    pub fn record_store_query(&self) {
        self.store_queries.fetch_add(1, Ordering::Relaxed);
        counter!(names::STORE_QUERIES_TOTAL).increment(1);
    }

    pub fn record_lock_timeout(&self) {
        self.lock_timeouts.fetch_add(1, Ordering::Relaxed);
        counter!(names::LOCK_TIMEOUTS_TOTAL).increment(1);
    }

    pub fn snapshot(&self, tier: Tier) -> TierSnapshot {
        let counters = self.tier(tier);
        TierSnapshot {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
            puts: counters.puts.load(Ordering::Relaxed),
            estimated_size: counters.estimated_size.load(Ordering::Relaxed),
        }
    }

    pub fn store_queries(&self) -> u64 {
        self.store_queries.load(Ordering::Relaxed)
    }

    pub fn lock_timeouts(&self) -> u64 {
        self.lock_timeouts.load(Ordering::Relaxed)
    }
}

/// Installs the Prometheus recorder behind the `metrics` facade.
///
/// Called once from the binary; the returned handle renders `GET /metrics`.
///
/// # Errors
///
/// Fails if another recorder is already installed.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}
