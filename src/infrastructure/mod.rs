//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain and application
//! layers, providing concrete backends for caching, locking, messaging and
//! persistence.
//!
//! # Modules
//!
//! - [`backoff`] - Reconnect delays for background connections
//! - [`cache`] - L1 (moka) and L2 (Redis or no-op) cache tiers
//! - [`coherence`] - Redis Pub/Sub transport for "record created" notifications
//! - [`lock`] - Lease-based lock backends (Redis and in-process)
//! - [`persistence`] - PostgreSQL store implementation

pub mod backoff;
pub mod cache;
pub mod coherence;
pub mod lock;
pub mod persistence;
