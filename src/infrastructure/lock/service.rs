//! Distributed lock capability used by the stampede guard.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

/// Errors raised by a lock backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    #[error("Lock backend unavailable: {0}")]
    Unavailable(String),
}

/// Minimal mutual-exclusion capability with leases.
///
/// Any backend that can hold a key for a bounded lease and release it only on
/// behalf of the holder that took it can implement this.
///
/// # Implementations
///
/// - [`crate::infrastructure::lock::RedisLockService`] - `SET NX PX` with compare-and-delete release
/// - [`crate::infrastructure::lock::MemoryLockService`] - in-process leases for single-instance runs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockService: Send + Sync {
    /// Tries to take `key` for `holder`, waiting up to `wait`.
    ///
    /// The lock expires on its own after `lease` if never released.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` once acquired
    /// - `Ok(false)` if another holder kept it for the whole wait
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Unavailable`] when the backend cannot be reached.
    async fn try_lock(
        &self,
        key: &str,
        holder: &str,
        wait: Duration,
        lease: Duration,
    ) -> Result<bool, LockError>;

    /// Releases `key` if, and only if, `holder` still owns it.
    ///
    /// Returns `Ok(false)` without touching the lock when the lease has
    /// already expired or passed to someone else.
    async fn unlock(&self, key: &str, holder: &str) -> Result<bool, LockError>;
}

enum Attempt {
    Contended,
    Backend(LockError),
}

/// Repeats `attempt` every `poll` until it succeeds, the backend fails, or
/// `wait` elapses.
///
/// `attempt` resolves to `Ok(true)` when the lock was taken and `Ok(false)`
/// when it is currently held elsewhere. At least one attempt is always made.
/// An attempt still running is never cancelled by the wait bound; instead
/// each attempt gets `attempt_timeout`, and an attempt that exceeds it is a
/// backend failure.
pub(crate) async fn acquire_with_polling<F, Fut>(
    wait: Duration,
    poll: Duration,
    attempt_timeout: Duration,
    mut attempt: F,
) -> Result<bool, LockError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, LockError>>,
{
    let deadline = Instant::now() + wait;

    let acquire = RetryIf::spawn(
        FixedInterval::new(poll),
        || {
            let fut = timeout(attempt_timeout, attempt());
            async move {
                match fut.await {
                    Ok(Ok(true)) => Ok(()),
                    Ok(Ok(false)) => Err(Attempt::Contended),
                    Ok(Err(e)) => Err(Attempt::Backend(e)),
                    Err(_) => Err(Attempt::Backend(LockError::Unavailable(format!(
                        "lock attempt timed out after {attempt_timeout:?}"
                    )))),
                }
            }
        },
        |e: &Attempt| matches!(e, Attempt::Contended) && Instant::now() + poll <= deadline,
    );

    match acquire.await {
        Ok(()) => Ok(true),
        Err(Attempt::Contended) => Ok(false),
        Err(Attempt::Backend(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_acquired() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let acquired = acquire_with_polling(
            Duration::from_secs(5),
            Duration::from_millis(25),
            ATTEMPT_TIMEOUT,
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 3) }
            },
        )
        .await;

        assert_eq!(acquired, Ok(true));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_wait() {
        let start = tokio::time::Instant::now();

        let acquired = acquire_with_polling(
            Duration::from_millis(500),
            Duration::from_millis(25),
            ATTEMPT_TIMEOUT,
            || async { Ok(false) },
        )
        .await;

        assert_eq!(acquired, Ok(false));
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_error_stops_polling() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let acquired = acquire_with_polling(
            Duration::from_secs(5),
            Duration::from_millis(25),
            ATTEMPT_TIMEOUT,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(LockError::Unavailable("connection refused".to_string())) }
            },
        )
        .await;

        assert!(matches!(acquired, Err(LockError::Unavailable(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_backend_is_an_error() {
        let start = tokio::time::Instant::now();

        let acquired = acquire_with_polling(
            Duration::from_secs(5),
            Duration::from_millis(25),
            ATTEMPT_TIMEOUT,
            || std::future::pending(),
        )
        .await;

        assert!(matches!(acquired, Err(LockError::Unavailable(_))));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_is_not_cut_by_wait() {
        let acquired = acquire_with_polling(
            Duration::from_millis(10),
            Duration::from_millis(25),
            ATTEMPT_TIMEOUT,
            || async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(true)
            },
        )
        .await;

        assert_eq!(acquired, Ok(true));
    }
}
