//! Store lookup contract for redirect records.

use crate::domain::entities::{RedirectRecord, ShortCode};
use async_trait::async_trait;

/// Errors raised by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Query(String),
    #[error("corrupt record for {code}: {reason}")]
    Corrupt { code: String, reason: String },
}

/// Authoritative source of redirect records.
///
/// The cache tiers only ever hint; a lookup here is ground truth.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRedirectStore`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedirectStore: Send + Sync {
    /// Finds the record for a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if the short code exists
    /// - `Ok(None)` if it was never created
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot answer.
    async fn find_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<RedirectRecord>, StoreError>;

    /// Inserts a new record.
    ///
    /// Used by the create side and test fixtures; the resolver never writes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] on database errors, including a duplicate short code.
    async fn insert(&self, record: &RedirectRecord) -> Result<(), StoreError>;
}
