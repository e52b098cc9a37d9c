#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use redirect_cache::application::services::{GuardSettings, RedirectResolver, StampedeGuard};
use redirect_cache::domain::entities::{RedirectRecord, ShortCode};
use redirect_cache::domain::repositories::{RedirectStore, StoreError};
use redirect_cache::infrastructure::cache::{
    CacheError, CacheResult, CacheService, CacheSettings, LocalCache, SharedCache,
};
use redirect_cache::infrastructure::lock::{LockService, MemoryLockService};
use redirect_cache::metrics::CacheMetrics;
use redirect_cache::state::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn code(raw: &str) -> ShortCode {
    ShortCode::parse(raw).unwrap()
}

pub fn record(raw: &str, target: &str) -> RedirectRecord {
    RedirectRecord::new(code(raw), target.to_string(), Utc::now())
}

/// In-memory store that counts lookups.
#[derive(Default)]
pub struct CountingStore {
    records: Mutex<HashMap<String, RedirectRecord>>,
    queries: AtomicUsize,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lookup sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn seed(&self, record: RedirectRecord) {
        self.records
            .lock()
            .insert(record.short_code.as_str().to_string(), record);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RedirectStore for CountingStore {
    async fn find_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<RedirectRecord>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Query("connection refused".to_string()));
        }

        Ok(self.records.lock().get(code.as_str()).cloned())
    }

    async fn insert(&self, record: &RedirectRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        if records.contains_key(record.short_code.as_str()) {
            return Err(StoreError::Query("duplicate short code".to_string()));
        }
        records.insert(record.short_code.as_str().to_string(), record.clone());
        Ok(())
    }
}

/// Shared-tier backend kept in a map, ignoring TTLs.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, RedirectRecord>>,
    puts: AtomicUsize,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.lock().contains_key(code)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get(&self, code: &ShortCode) -> CacheResult<Option<RedirectRecord>> {
        Ok(self.entries.lock().get(code.as_str()).cloned())
    }

    async fn put(&self, record: &RedirectRecord, _ttl: Duration) -> CacheResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .insert(record.short_code.as_str().to_string(), record.clone());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Shared-tier backend with a fixed round-trip latency.
#[derive(Default)]
pub struct SlowCache {
    inner: InMemoryCache,
    latency: Duration,
}

impl SlowCache {
    pub fn new(latency: Duration) -> Self {
        Self {
            inner: InMemoryCache::new(),
            latency,
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.inner.contains(code)
    }
}

#[async_trait]
impl CacheService for SlowCache {
    async fn get(&self, code: &ShortCode) -> CacheResult<Option<RedirectRecord>> {
        tokio::time::sleep(self.latency).await;
        self.inner.get(code).await
    }

    async fn put(&self, record: &RedirectRecord, ttl: Duration) -> CacheResult<()> {
        tokio::time::sleep(self.latency).await;
        self.inner.put(record, ttl).await
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Shared-tier backend whose every call fails.
pub struct FailingCache;

#[async_trait]
impl CacheService for FailingCache {
    async fn get(&self, _code: &ShortCode) -> CacheResult<Option<RedirectRecord>> {
        Err(CacheError::ConnectionError("connection refused".to_string()))
    }

    async fn put(&self, _record: &RedirectRecord, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::ConnectionError("connection refused".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Shared-tier backend that never answers.
pub struct HangingCache;

#[async_trait]
impl CacheService for HangingCache {
    async fn get(&self, _code: &ShortCode) -> CacheResult<Option<RedirectRecord>> {
        std::future::pending().await
    }

    async fn put(&self, _record: &RedirectRecord, _ttl: Duration) -> CacheResult<()> {
        std::future::pending().await
    }

    async fn health_check(&self) -> bool {
        std::future::pending().await
    }
}

/// A fully wired resolver over fakes.
pub struct Harness {
    pub resolver: Arc<RedirectResolver>,
    pub local: Arc<LocalCache>,
    pub shared: Arc<SharedCache>,
    pub locks: Arc<MemoryLockService>,
    pub store: Arc<CountingStore>,
    pub metrics: Arc<CacheMetrics>,
}

impl Harness {
    pub fn new(store: CountingStore, backend: Arc<dyn CacheService>) -> Self {
        Self::with_settings(store, backend, GuardSettings::default())
    }

    pub fn with_settings(
        store: CountingStore,
        backend: Arc<dyn CacheService>,
        guard_settings: GuardSettings,
    ) -> Self {
        let settings = CacheSettings::default();
        let metrics = Arc::new(CacheMetrics::new());
        let local = Arc::new(LocalCache::new(
            settings.l1_capacity,
            settings.l1_ttl,
            metrics.clone(),
        ));
        let shared = Arc::new(SharedCache::new(
            backend,
            settings.l2_ttl,
            settings.l2_timeout,
            metrics.clone(),
        ));
        let locks = Arc::new(MemoryLockService::new(guard_settings.poll_interval));
        let guard = StampedeGuard::new(
            locks.clone() as Arc<dyn LockService>,
            guard_settings,
            metrics.clone(),
        );
        let store = Arc::new(store);
        let resolver = Arc::new(RedirectResolver::new(
            local.clone(),
            shared.clone(),
            guard,
            store.clone(),
            metrics.clone(),
        ));

        Self {
            resolver,
            local,
            shared,
            locks,
            store,
            metrics,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.resolver.clone(), self.shared.clone(), None)
    }
}
