//! Redis-backed distributed lock.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::debug;

use super::service::{LockError, LockService, acquire_with_polling};

/// Deletes the key only when it still holds the caller's token.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Lease-based lock on a shared Redis.
///
/// Acquisition is `SET <key> <holder> NX PX <lease>`, retried every
/// `poll_interval` until the wait runs out. Release runs a compare-and-delete
/// script so an expired holder can never delete a lock that has since been
/// claimed by another instance.
///
/// Every round trip is bounded by `request_timeout`; a command that does not
/// answer in time is reported as [`LockError::Unavailable`].
pub struct RedisLockService {
    client: ConnectionManager,
    key_prefix: String,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl RedisLockService {
    pub fn new(
        client: ConnectionManager,
        poll_interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            key_prefix: "lock:redirect:".to_string(),
            poll_interval,
            request_timeout,
        }
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn attempt(&self, key: &str, holder: &str, lease: Duration) -> Result<bool, LockError> {
        let mut conn = self.client.clone();
        let lease_ms = u64::try_from(lease.as_millis()).unwrap_or(u64::MAX).max(1);

        let reply = redis::cmd("SET")
            .arg(key)
            .arg(holder)
            .arg("NX")
            .arg("PX")
            .arg(lease_ms)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(|e| LockError::Unavailable(format!("SET NX {}: {}", key, e)))?;

        Ok(reply.is_some())
    }
}

#[async_trait]
impl LockService for RedisLockService {
    async fn try_lock(
        &self,
        key: &str,
        holder: &str,
        wait: Duration,
        lease: Duration,
    ) -> Result<bool, LockError> {
        let key = self.build_key(key);
        acquire_with_polling(wait, self.poll_interval, self.request_timeout, || {
            self.attempt(&key, holder, lease)
        })
        .await
    }

    async fn unlock(&self, key: &str, holder: &str) -> Result<bool, LockError> {
        let key = self.build_key(key);
        let mut conn = self.client.clone();

        let mut cmd = redis::cmd("EVAL");
        let release = cmd
            .arg(RELEASE_SCRIPT)
            .arg(1)
            .arg(&key)
            .arg(holder)
            .query_async::<i64>(&mut conn);

        let deleted = tokio::time::timeout(self.request_timeout, release)
            .await
            .map_err(|_| LockError::Unavailable(format!("release {}: timed out", key)))?
            .map_err(|e| LockError::Unavailable(format!("release {}: {}", key, e)))?;

        if deleted == 0 {
            debug!(key = %key, holder = %holder, "lock no longer held by caller, release skipped");
        }

        Ok(deleted > 0)
    }
}
