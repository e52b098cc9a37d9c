//! Mutual-exclusion backends for cold-path loads.
//!
//! Provides a [`LockService`] trait with two implementations:
//! - [`RedisLockService`] - Cluster-wide leases on the shared Redis
//! - [`MemoryLockService`] - In-process leases when Redis is not configured

mod memory_lock;
mod redis_lock;
mod service;

pub use memory_lock::MemoryLockService;
pub use redis_lock::RedisLockService;
pub use service::{LockError, LockService};

#[cfg(test)]
pub use service::MockLockService;
