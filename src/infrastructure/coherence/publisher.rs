//! Outbound side of the coherence channel.

use async_trait::async_trait;

use crate::domain::record_created::RecordCreated;
use crate::infrastructure::cache::CacheError;

/// Emits "record created" notifications to other instances.
///
/// # Implementations
///
/// - [`super::RedisCoherencePublisher`] - Redis `PUBLISH`
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoherencePublisher: Send + Sync {
    /// Publishes `event` and returns how many subscribers received it.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the channel is unreachable. A failed
    /// publish never affects correctness; receivers that miss it load from
    /// the store on first read.
    async fn publish(&self, event: &RecordCreated) -> Result<usize, CacheError>;
}
