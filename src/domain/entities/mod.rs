//! Core domain entities for the redirect cache.
//!
//! # Entity Types
//!
//! - [`ShortCode`] - Validated lookup key shared by every tier
//! - [`RedirectRecord`] - Immutable short code to target URL mapping
//! - [`CacheEntry`] - A tier-owned copy of a record with its insertion and expiry times

pub mod redirect_record;
pub mod short_code;

pub use redirect_record::{CacheEntry, RedirectRecord};
pub use short_code::{InvalidShortCode, ShortCode};
