//! Redis-backed shared cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use crate::domain::entities::{RedirectRecord, ShortCode};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// Redis cache implementation for the shared tier.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// Records are stored as JSON under `redirect:<code>` with `SET EX`.
/// Errors are returned to [`crate::infrastructure::cache::SharedCache`], which
/// degrades them to misses.
pub struct RedisCache {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self::with_connection(manager))
    }

    /// Builds a cache over an existing connection.
    pub fn with_connection(manager: ConnectionManager) -> Self {
        Self {
            client: manager,
            key_prefix: "redirect:".to_string(),
        }
    }

    /// Returns a handle to the underlying connection for sibling Redis users
    /// (lock service, coherence publisher).
    pub fn connection(&self) -> ConnectionManager {
        self.client.clone()
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, code: &ShortCode) -> CacheResult<Option<RedirectRecord>> {
        let key = self.build_key(code);
        let mut conn = self.client.clone();

        let payload = conn
            .get::<_, Option<String>>(&key)
            .await
            .map_err(|e| CacheError::OperationError(format!("GET {}: {}", key, e)))?;

        match payload {
            Some(json) => {
                let record = serde_json::from_str::<RedirectRecord>(&json)
                    .map_err(|e| CacheError::DecodeError(format!("{}: {}", key, e)))?;
                Ok(Some(record))
            }
            None => {
                debug!(short_code = %code, "Redis MISS");
                Ok(None)
            }
        }
    }

    async fn put(&self, record: &RedirectRecord, ttl: Duration) -> CacheResult<()> {
        let key = self.build_key(&record.short_code);
        let mut conn = self.client.clone();
        let payload = serde_json::to_string(record)
            .map_err(|e| CacheError::OperationError(format!("encode {}: {}", key, e)))?;

        conn.set_ex::<_, _, ()>(&key, payload, ttl.as_secs().max(1))
            .await
            .map_err(|e| CacheError::OperationError(format!("SET {}: {}", key, e)))?;

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
