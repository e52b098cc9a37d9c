//! Distributed stampede protection around cold-path loads.

use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::infrastructure::lock::{LockError, LockService};
use crate::metrics::CacheMetrics;

/// Wait, lease and polling bounds for lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardSettings {
    pub wait: Duration,
    pub lease: Duration,
    pub poll_interval: Duration,
    /// Longest a single lock backend call may take beyond its own wait.
    pub backend_timeout: Duration,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(5),
            lease: Duration::from_secs(10),
            poll_interval: Duration::from_millis(25),
            backend_timeout: Duration::from_millis(250),
        }
    }
}

/// Failure to run a loader under the guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("could not acquire lock for {key} within {waited:?}")]
    LockAcquisitionFailed { key: String, waited: Duration },
}

/// Bounds concurrent cold-path loads per key across the fleet.
///
/// # Guarantees
///
/// - At most one caller per key runs its loader while the lease is live.
///   A loader that outlives the lease may overlap with the next holder.
/// - Waiters re-check for the value between lock attempts and return it as
///   soon as the winner has published it.
/// - Timing out on the wait is reported as [`GuardError::LockAcquisitionFailed`]
///   and never retried here.
/// - The lock is released after the loader finishes, panics or is dropped
///   mid-flight, and only if this caller is still the recorded holder.
/// - If the lock backend fails or does not answer within
///   [`GuardSettings::backend_timeout`] the loader runs unguarded.
pub struct StampedeGuard {
    locks: RwLock<Arc<dyn LockService>>,
    settings: GuardSettings,
    metrics: Arc<CacheMetrics>,
}

impl StampedeGuard {
    pub fn new(
        locks: Arc<dyn LockService>,
        settings: GuardSettings,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            locks: RwLock::new(locks),
            settings,
            metrics,
        }
    }

    /// Switches later acquisitions to `locks`.
    ///
    /// Locks already held stay with the backend that granted them.
    pub fn replace_locks(&self, locks: Arc<dyn LockService>) {
        *self.locks.write() = locks;
        info!("stampede guard switched lock backend");
    }

    /// Runs `loader` while holding the lock for `key`.
    ///
    /// While the lock is held elsewhere, `peek` is polled after every failed
    /// attempt; the first value it yields is returned without running
    /// `loader`.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::LockAcquisitionFailed`] if another holder kept
    /// the lock for the whole wait bound and `peek` never yielded.
    pub async fn execute<T, P, PFut, F, Fut>(
        &self,
        key: &str,
        mut peek: P,
        loader: F,
    ) -> Result<T, GuardError>
    where
        P: FnMut() -> PFut,
        PFut: Future<Output = Option<T>>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let locks = self.locks.read().clone();
        let holder = Uuid::new_v4().to_string();
        let deadline = Instant::now() + self.settings.wait;
        let bound = self.settings.poll_interval + self.settings.backend_timeout;

        // Covers attempts whose outcome is unknown: cancelled or timed out.
        let pending = HeldLock::new(
            locks.clone(),
            key,
            holder.clone(),
            self.settings.backend_timeout,
        );

        loop {
            let attempt = locks.try_lock(
                key,
                &holder,
                self.settings.poll_interval,
                self.settings.lease,
            );
            let acquired = match timeout(bound, attempt).await {
                Ok(result) => result,
                Err(_) => Err(LockError::Unavailable(format!("no answer within {bound:?}"))),
            };

            match acquired {
                Ok(true) => {
                    debug!(key = %key, holder = %holder, "lock acquired");
                    let value = loader().await;
                    pending.release().await;
                    return Ok(value);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "lock backend unavailable, loading unguarded");
                    drop(pending);
                    return Ok(loader().await);
                }
            }

            if let Some(value) = peek().await {
                debug!(key = %key, "value published while waiting for lock");
                pending.forget();
                return Ok(value);
            }

            if Instant::now() >= deadline {
                pending.forget();
                self.metrics.record_lock_timeout();
                warn!(key = %key, waited = ?self.settings.wait, "lock acquisition timed out");
                return Err(GuardError::LockAcquisitionFailed {
                    key: key.to_string(),
                    waited: self.settings.wait,
                });
            }
        }
    }
}

/// A possibly held lock that is released on every exit path.
///
/// The happy path calls [`HeldLock::release`]; a caller that knows it never
/// got the lock calls [`HeldLock::forget`]. If the owning future is dropped
/// (caller cancellation, timeout, panic in the loader) the `Drop` impl
/// schedules the release on the current runtime instead; the lease covers
/// the case where no runtime is left to run it.
struct HeldLock {
    locks: Arc<dyn LockService>,
    key: String,
    holder: String,
    unlock_timeout: Duration,
    released: bool,
}

impl HeldLock {
    fn new(
        locks: Arc<dyn LockService>,
        key: &str,
        holder: String,
        unlock_timeout: Duration,
    ) -> Self {
        Self {
            locks,
            key: key.to_string(),
            holder,
            unlock_timeout,
            released: false,
        }
    }

    async fn release(mut self) {
        self.released = true;
        release_lock(
            self.locks.as_ref(),
            &self.key,
            &self.holder,
            self.unlock_timeout,
        )
        .await;
    }

    fn forget(mut self) {
        self.released = true;
    }
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key = %self.key, "no runtime to release lock, leaving it to lease expiry");
            return;
        };

        let locks = self.locks.clone();
        let key = std::mem::take(&mut self.key);
        let holder = std::mem::take(&mut self.holder);
        let unlock_timeout = self.unlock_timeout;
        runtime.spawn(async move {
            release_lock(locks.as_ref(), &key, &holder, unlock_timeout).await;
        });
    }
}

async fn release_lock(locks: &dyn LockService, key: &str, holder: &str, bound: Duration) {
    match timeout(bound, locks.unlock(key, holder)).await {
        Ok(Ok(true)) => debug!(key = %key, holder = %holder, "lock released"),
        Ok(Ok(false)) => {
            debug!(key = %key, holder = %holder, "lock not held by caller, unlock skipped")
        }
        Ok(Err(e)) => warn!(key = %key, error = %e, "lock release failed, lease will expire"),
        Err(_) => warn!(key = %key, "lock release timed out, lease will expire"),
    }
}
