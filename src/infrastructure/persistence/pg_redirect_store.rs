//! PostgreSQL implementation of the redirect store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{RedirectRecord, ShortCode};
use crate::domain::repositories::{RedirectStore, StoreError};

#[derive(sqlx::FromRow)]
struct RedirectRow {
    short_code: String,
    target_url: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RedirectRow> for RedirectRecord {
    type Error = StoreError;

    fn try_from(row: RedirectRow) -> Result<Self, Self::Error> {
        let short_code = ShortCode::parse(row.short_code.as_str()).map_err(|e| StoreError::Corrupt {
            code: row.short_code.clone(),
            reason: e.to_string(),
        })?;

        Ok(RedirectRecord::new(short_code, row.target_url, row.created_at))
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

/// PostgreSQL repository for redirect records.
///
/// Uses bound parameters for SQL injection protection; queries are checked at
/// runtime so the crate builds without a live database.
pub struct PgRedirectStore {
    pool: Arc<PgPool>,
}

impl PgRedirectStore {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedirectStore for PgRedirectStore {
    async fn find_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<RedirectRecord>, StoreError> {
        let row = sqlx::query_as::<_, RedirectRow>(
            r#"
            SELECT short_code, target_url, created_at
            FROM redirects
            WHERE short_code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        row.map(RedirectRecord::try_from).transpose()
    }

    async fn insert(&self, record: &RedirectRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO redirects (short_code, target_url, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(record.short_code.as_str())
        .bind(&record.target_url)
        .bind(record.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let now = Utc::now();
        let row = RedirectRow {
            short_code: "abc123".to_string(),
            target_url: "https://example.com".to_string(),
            created_at: now,
        };

        let record = RedirectRecord::try_from(row).unwrap();
        assert_eq!(record.short_code.as_str(), "abc123");
        assert_eq!(record.target_url, "https://example.com");
        assert_eq!(record.created_at, now);
    }

    #[test]
    fn test_row_with_invalid_code_is_corrupt() {
        let row = RedirectRow {
            short_code: "x".to_string(),
            target_url: "https://example.com".to_string(),
            created_at: Utc::now(),
        };

        assert!(matches!(
            RedirectRecord::try_from(row),
            Err(StoreError::Corrupt { ref code, .. }) if code == "x"
        ));
    }
}
