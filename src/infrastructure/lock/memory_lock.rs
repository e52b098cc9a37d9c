//! In-process leased lock.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::service::{LockError, LockService, acquire_with_polling};

struct Lease {
    holder: String,
    expires_at: Instant,
}

/// Lock service whose leases live in this process only.
///
/// Gives the same contract as the Redis backend (bounded wait, lease expiry,
/// holder-checked release) without cross-instance reach. Used when Redis is
/// not configured, where the fleet is a single instance anyway.
pub struct MemoryLockService {
    leases: Mutex<HashMap<String, Lease>>,
    poll_interval: Duration,
}

impl MemoryLockService {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            poll_interval,
        }
    }

    fn attempt(&self, key: &str, holder: &str, lease: Duration) -> bool {
        let now = Instant::now();
        let mut leases = self.leases.lock();

        match leases.get(key) {
            Some(current) if current.expires_at > now => false,
            _ => {
                leases.insert(
                    key.to_string(),
                    Lease {
                        holder: holder.to_string(),
                        expires_at: now + lease,
                    },
                );
                true
            }
        }
    }

    /// Current holder of `key`, if its lease is still live.
    pub fn holder(&self, key: &str) -> Option<String> {
        let leases = self.leases.lock();
        leases
            .get(key)
            .filter(|lease| lease.expires_at > Instant::now())
            .map(|lease| lease.holder.clone())
    }
}

impl Default for MemoryLockService {
    fn default() -> Self {
        Self::new(Duration::from_millis(25))
    }
}

#[async_trait]
impl LockService for MemoryLockService {
    async fn try_lock(
        &self,
        key: &str,
        holder: &str,
        wait: Duration,
        lease: Duration,
    ) -> Result<bool, LockError> {
        // Attempts complete synchronously, so they need no timeout of their own.
        acquire_with_polling(wait, self.poll_interval, Duration::MAX, || {
            let acquired = self.attempt(key, holder, lease);
            async move { Ok(acquired) }
        })
        .await
    }

    async fn unlock(&self, key: &str, holder: &str) -> Result<bool, LockError> {
        let mut leases = self.leases.lock();

        match leases.get(key) {
            Some(current) if current.holder == holder => {
                leases.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(200);
    const LEASE: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn test_lock_is_exclusive() {
        let locks = MemoryLockService::default();

        assert_eq!(locks.try_lock("k", "a", WAIT, LEASE).await, Ok(true));
        assert_eq!(locks.try_lock("k", "b", WAIT, LEASE).await, Ok(false));
        assert_eq!(locks.holder("k").as_deref(), Some("a"));

        assert_eq!(locks.unlock("k", "a").await, Ok(true));
        assert_eq!(locks.try_lock("k", "b", WAIT, LEASE).await, Ok(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_by_non_holder_is_noop() {
        let locks = MemoryLockService::default();

        locks.try_lock("k", "a", WAIT, LEASE).await.unwrap();

        assert_eq!(locks.unlock("k", "b").await, Ok(false));
        assert_eq!(locks.holder("k").as_deref(), Some("a"));
        assert_eq!(locks.unlock("missing", "a").await, Ok(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lease_expiry_frees_lock() {
        let locks = MemoryLockService::default();

        locks
            .try_lock("k", "stalled", WAIT, Duration::from_millis(100))
            .await
            .unwrap();

        // The waiter outlasts the stalled holder's lease.
        assert_eq!(locks.try_lock("k", "b", WAIT, LEASE).await, Ok(true));
        assert_eq!(locks.holder("k").as_deref(), Some("b"));

        // The stalled holder must not release the new owner's lock.
        assert_eq!(locks.unlock("k", "stalled").await, Ok(false));
        assert_eq!(locks.holder("k").as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_acquires_after_release() {
        let locks = std::sync::Arc::new(MemoryLockService::default());
        locks.try_lock("k", "a", WAIT, LEASE).await.unwrap();

        let releaser = locks.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            releaser.unlock("k", "a").await.unwrap();
        });

        assert_eq!(
            locks
                .try_lock("k", "b", Duration::from_secs(1), LEASE)
                .await,
            Ok(true)
        );
    }
}
