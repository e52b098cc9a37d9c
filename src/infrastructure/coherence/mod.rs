//! Coherence channel transport.
//!
//! A single transport carries "record created" notifications: Redis Pub/Sub.
//!
//! - [`RedisCoherenceListener`] - Subscribes and feeds the coherence subscriber queue
//! - [`CoherencePublisher`] - Emits notifications from the create side, implemented
//!   by [`RedisCoherencePublisher`]

mod publisher;
mod redis_pubsub;

pub use publisher::CoherencePublisher;
pub use redis_pubsub::{RedisCoherenceListener, RedisCoherencePublisher};

#[cfg(test)]
pub use publisher::MockCoherencePublisher;
