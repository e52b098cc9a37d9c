//! PostgreSQL repository implementations.
//!
//! # Repositories
//!
//! - [`PgRedirectStore`] - Authoritative redirect record lookup and insert

pub mod pg_redirect_store;

pub use pg_redirect_store::PgRedirectStore;
