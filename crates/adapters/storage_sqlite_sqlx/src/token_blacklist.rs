//! `SQLite` implementation of [`TokenBlacklist`].
//!
//! Revocations survive restarts. Rows whose token has already expired are
//! purged whenever a new revocation is recorded.

use std::future::Future;

use sqlx::SqlitePool;

use pmtrack_app::ports::TokenBlacklist;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::time::{Timestamp, now};

use crate::codec::encode_timestamp;
use crate::error::StorageError;

const PURGE_EXPIRED: &str = "DELETE FROM revoked_tokens WHERE expires_at <= ?";
const UPSERT: &str = "INSERT INTO revoked_tokens (jti, expires_at) VALUES (?, ?) ON CONFLICT (jti) DO UPDATE SET expires_at = excluded.expires_at";
const SELECT_LIVE: &str = "SELECT COUNT(*) FROM revoked_tokens WHERE jti = ? AND expires_at > ?";

/// Persistent revocation list keyed by token id.
#[derive(Clone)]
pub struct SqliteTokenBlacklist {
    pool: SqlitePool,
}

impl SqliteTokenBlacklist {
    /// Create a new blacklist using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TokenBlacklist for SqliteTokenBlacklist {
    fn revoke(
        &self,
        jti: &str,
        expires_at: Timestamp,
    ) -> impl Future<Output = Result<(), PmTrackError>> + Send {
        let pool = self.pool.clone();
        let jti = jti.to_string();
        async move {
            let current = encode_timestamp(now());
            let purged = sqlx::query(PURGE_EXPIRED)
                .bind(&current)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?
                .rows_affected();
            if purged > 0 {
                tracing::debug!(purged, "purged expired token revocations");
            }

            if expires_at > now() {
                sqlx::query(UPSERT)
                    .bind(&jti)
                    .bind(encode_timestamp(expires_at))
                    .execute(&pool)
                    .await
                    .map_err(StorageError::from)?;
            }

            Ok(())
        }
    }

    fn is_revoked(&self, jti: &str) -> impl Future<Output = Result<bool, PmTrackError>> + Send {
        let pool = self.pool.clone();
        let jti = jti.to_string();
        async move {
            let (count,): (i64,) = sqlx::query_as(SELECT_LIVE)
                .bind(&jti)
                .bind(encode_timestamp(now()))
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(count > 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::Duration;

    #[tokio::test]
    async fn should_report_revoked_token_until_expiry() {
        let blacklist = SqliteTokenBlacklist::new(fixtures::pool().await);

        blacklist
            .revoke("abc", now() + Duration::minutes(30))
            .await
            .unwrap();

        assert!(blacklist.is_revoked("abc").await.unwrap());
        assert!(!blacklist.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn should_ignore_already_expired_tokens() {
        let blacklist = SqliteTokenBlacklist::new(fixtures::pool().await);

        blacklist
            .revoke("stale", now() - Duration::minutes(1))
            .await
            .unwrap();

        assert!(!blacklist.is_revoked("stale").await.unwrap());
    }

    #[tokio::test]
    async fn should_purge_expired_rows_on_revoke() {
        let pool = fixtures::pool().await;
        sqlx::query("INSERT INTO revoked_tokens (jti, expires_at) VALUES ('old', '2000-01-01T00:00:00.000000Z')")
            .execute(&pool)
            .await
            .unwrap();
        let blacklist = SqliteTokenBlacklist::new(pool.clone());

        blacklist
            .revoke("fresh", now() + Duration::minutes(5))
            .await
            .unwrap();

        let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM revoked_tokens")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
