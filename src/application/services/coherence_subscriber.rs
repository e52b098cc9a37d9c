//! Push-on-create cache warming.

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::services::redirect_resolver::warm_tiers;
use crate::domain::record_created::RecordCreated;
use crate::infrastructure::cache::{LocalCache, SharedCache};

/// Number of recent event ids remembered for duplicate suppression.
const RECENT_EVENT_WINDOW: usize = 1024;

/// What happened to a delivered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmOutcome {
    Warmed,
    Duplicate,
    Rejected,
}

/// Bounded FIFO set of event ids.
struct RecentEvents {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl RecentEvents {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `false` if `event_id` was already recorded.
    fn insert(&mut self, event_id: &str) -> bool {
        if self.seen.contains(event_id) {
            return false;
        }

        if self.order.len() == self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.seen.remove(&oldest);
        }

        self.order.push_back(event_id.to_string());
        self.seen.insert(event_id.to_string());
        true
    }
}

/// Warms L2 then L1 from "record created" notifications.
///
/// Records are built straight from the payload, so warming never reads the
/// store. Delivery is best-effort: a lost notification only costs a later
/// miss. Duplicates are skipped by event id inside a small window; outside
/// it a replay rewrites the same immutable value.
pub struct CoherenceSubscriber {
    local: Arc<LocalCache>,
    shared: Arc<SharedCache>,
    recent: Mutex<RecentEvents>,
}

impl CoherenceSubscriber {
    pub fn new(local: Arc<LocalCache>, shared: Arc<SharedCache>) -> Self {
        Self {
            local,
            shared,
            recent: Mutex::new(RecentEvents::new(RECENT_EVENT_WINDOW)),
        }
    }

    /// Applies one notification to both tiers.
    pub async fn apply(&self, event: RecordCreated) -> WarmOutcome {
        let record = match event.to_record() {
            Ok(record) => record,
            Err(e) => {
                warn!(event_id = %event.event_id, error = %e, "dropping invalid coherence event");
                return WarmOutcome::Rejected;
            }
        };

        if !self.recent.lock().insert(&event.event_id) {
            debug!(event_id = %event.event_id, "duplicate coherence event skipped");
            return WarmOutcome::Duplicate;
        }

        debug!(event_id = %event.event_id, short_code = %record.short_code, "warming tiers");
        warm_tiers(&self.local, &self.shared, record).await;
        WarmOutcome::Warmed
    }

    /// Drains `rx` until every sender is gone.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<RecordCreated>) {
        info!("Coherence subscriber started");

        while let Some(event) = rx.recv().await {
            self.apply(event).await;
        }

        info!("Coherence subscriber stopped");
    }
}

/// Spawns [`CoherenceSubscriber::run`] on a fresh bounded queue.
///
/// Returns the sender side for a transport listener to feed.
pub fn spawn_coherence_subscriber(
    subscriber: Arc<CoherenceSubscriber>,
    queue_capacity: usize,
) -> (mpsc::Sender<RecordCreated>, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue_capacity);
    let handle = tokio::spawn(subscriber.run(rx));
    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ShortCode;
    use crate::infrastructure::cache::{MockCacheService, NullCache};
    use crate::metrics::{CacheMetrics, Tier};
    use chrono::Utc;
    use std::time::Duration;

    fn event(id: &str, code: &str) -> RecordCreated {
        RecordCreated {
            event_id: id.to_string(),
            short_code: code.to_string(),
            target_url: format!("https://example.com/{code}"),
            created_at: Utc::now(),
        }
    }

    fn subscriber_with(backend: MockCacheService) -> (CoherenceSubscriber, Arc<LocalCache>, Arc<CacheMetrics>) {
        let metrics = Arc::new(CacheMetrics::new());
        let local = Arc::new(LocalCache::new(
            1_000,
            Duration::from_secs(600),
            metrics.clone(),
        ));
        let shared = Arc::new(SharedCache::new(
            Arc::new(backend),
            Duration::from_secs(3600),
            Duration::from_millis(250),
            metrics.clone(),
        ));
        (
            CoherenceSubscriber::new(local.clone(), shared),
            local,
            metrics,
        )
    }

    #[tokio::test]
    async fn test_apply_warms_both_tiers() {
        let mut backend = MockCacheService::new();
        backend
            .expect_put()
            .withf(|record, _| record.short_code.as_str() == "xyz789")
            .times(1)
            .returning(|_, _| Ok(()));
        backend.expect_get().times(0);

        let (subscriber, local, metrics) = subscriber_with(backend);

        assert_eq!(
            subscriber.apply(event("evt-1", "xyz789")).await,
            WarmOutcome::Warmed
        );

        let entry = local.entry(&ShortCode::parse("xyz789").unwrap()).unwrap();
        assert_eq!(entry.value.target_url, "https://example.com/xyz789");
        assert_eq!(metrics.snapshot(Tier::L2).puts, 1);
        assert_eq!(metrics.snapshot(Tier::L1).puts, 1);
    }

    #[tokio::test]
    async fn test_duplicate_event_is_skipped() {
        let mut backend = MockCacheService::new();
        backend.expect_put().times(1).returning(|_, _| Ok(()));

        let (subscriber, _local, _metrics) = subscriber_with(backend);

        assert_eq!(
            subscriber.apply(event("evt-1", "xyz789")).await,
            WarmOutcome::Warmed
        );
        assert_eq!(
            subscriber.apply(event("evt-1", "xyz789")).await,
            WarmOutcome::Duplicate
        );
    }

    #[tokio::test]
    async fn test_invalid_event_is_rejected() {
        let mut backend = MockCacheService::new();
        backend.expect_put().times(0);

        let (subscriber, local, _metrics) = subscriber_with(backend);

        assert_eq!(
            subscriber.apply(event("evt-9", "bad!")).await,
            WarmOutcome::Rejected
        );
        assert_eq!(local.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_l2_outage_still_warms_l1() {
        let mut backend = MockCacheService::new();
        backend.expect_put().times(1).returning(|_, _| {
            Err(crate::infrastructure::cache::CacheError::ConnectionError(
                "refused".to_string(),
            ))
        });

        let (subscriber, local, _metrics) = subscriber_with(backend);
        subscriber.apply(event("evt-1", "xyz789")).await;

        assert!(local.entry(&ShortCode::parse("xyz789").unwrap()).is_some());
    }

    #[tokio::test]
    async fn test_run_drains_queue_until_closed() {
        let metrics = Arc::new(CacheMetrics::new());
        let local = Arc::new(LocalCache::new(
            1_000,
            Duration::from_secs(600),
            metrics.clone(),
        ));
        let shared = Arc::new(SharedCache::new(
            Arc::new(NullCache::new()),
            Duration::from_secs(3600),
            Duration::from_millis(250),
            metrics,
        ));
        let subscriber = Arc::new(CoherenceSubscriber::new(local.clone(), shared));

        let (tx, handle) = spawn_coherence_subscriber(subscriber, 16);
        for i in 0..5 {
            tx.send(event(&format!("evt-{i}"), &format!("code{i:02}")))
                .await
                .unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        for i in 0..5 {
            let code = ShortCode::parse(format!("code{i:02}")).unwrap();
            assert!(local.entry(&code).is_some());
        }
    }

    #[test]
    fn test_recent_events_window_is_bounded() {
        let mut recent = RecentEvents::new(2);

        assert!(recent.insert("a"));
        assert!(recent.insert("b"));
        assert!(!recent.insert("a"));
        assert!(recent.insert("c"));
        // "a" fell out of the window.
        assert!(recent.insert("a"));
        assert_eq!(recent.order.len(), 2);
    }
}
