//! Application layer services implementing the tiered read path.
//!
//! Services consume the cache tiers, the lock service and the store trait,
//! and expose a transport-agnostic async API to the edge.
//!
//! # Available Services
//!
//! - [`services::redirect_resolver::RedirectResolver`] - L1 → L2 → guarded store lookup
//! - [`services::stampede_guard::StampedeGuard`] - Distributed lock around cold loads
//! - [`services::coherence_subscriber::CoherenceSubscriber`] - Push-on-create cache warming
//! - [`services::record_registrar::RecordRegistrar`] - Create-side insert, warm and announce

pub mod services;
