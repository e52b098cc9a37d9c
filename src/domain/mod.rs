//! Domain layer containing the redirect model and its external contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Short codes, redirect records and cache entries
//! - [`repositories`] - Store lookup trait implemented by the persistence layer
//! - [`record_created`] - Coherence notification emitted when a mapping is created
//!
//! The domain layer has no dependency on Redis, PostgreSQL or HTTP.
//!
//! # Coherence Flow
//!
//! 1. The create side inserts a record through [`repositories::RedirectStore`]
//! 2. It publishes a [`record_created::RecordCreated`] notification
//! 3. Every instance's coherence subscriber warms L2 then L1 from the payload

pub mod entities;
pub mod record_created;
pub mod repositories;
