//! Redirect record entity and its per-tier cache envelope.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::short_code::ShortCode;

/// An immutable short code to target URL mapping.
///
/// Created once at URL-creation time and never updated or deleted by the
/// cache subsystem. The JSON form (`shortCode`, `targetUrl`, `createdAt`) is
/// shared by the L2 payload and the coherence channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRecord {
    pub short_code: ShortCode,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
}

impl RedirectRecord {
    /// Creates a new RedirectRecord instance.
    pub fn new(short_code: ShortCode, target_url: String, created_at: DateTime<Utc>) -> Self {
        Self {
            short_code,
            target_url,
            created_at,
        }
    }
}

/// A tier-owned copy of a [`RedirectRecord`].
///
/// Each tier builds its own entry from an owned record, so no two tiers ever
/// hold the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: ShortCode,
    pub value: RedirectRecord,
    pub inserted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Wraps `value` with an expiry of `ttl` from now.
    pub fn new(value: RedirectRecord, ttl: std::time::Duration) -> Self {
        let inserted_at = Utc::now();
        let ttl = Duration::from_std(ttl).unwrap_or(Duration::MAX);
        let expires_at = inserted_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            key: value.short_code.clone(),
            value,
            inserted_at,
            expires_at,
        }
    }
}
