//! In-process token revocation.
//!
//! [`InMemoryTokenBlacklist`] keeps revoked token ids in memory until they
//! expire. [`FallbackTokenBlacklist`] fronts a shared store with a local
//! blacklist that takes over whenever the shared store fails.

use std::collections::HashMap;

use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::time::{Timestamp, now};
use tokio::sync::RwLock;

use crate::ports::TokenBlacklist;

/// Revoked token ids held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTokenBlacklist {
    entries: RwLock<HashMap<String, Timestamp>>,
}

impl InMemoryTokenBlacklist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenBlacklist for InMemoryTokenBlacklist {
    async fn revoke(&self, jti: &str, expires_at: Timestamp) -> Result<(), PmTrackError> {
        let current = now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expiry| *expiry > current);
        if expires_at > current {
            entries.insert(jti.to_string(), expires_at);
        }
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, PmTrackError> {
        let entries = self.entries.read().await;
        Ok(entries.get(jti).is_some_and(|expiry| *expiry > now()))
    }
}

/// A primary blacklist backed by a secondary one.
///
/// Revocations that the primary cannot record land in the fallback, so a
/// lookup consults both.
#[derive(Debug)]
pub struct FallbackTokenBlacklist<P, F = InMemoryTokenBlacklist> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackTokenBlacklist<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> TokenBlacklist for FallbackTokenBlacklist<P, F>
where
    P: TokenBlacklist + Send + Sync,
    F: TokenBlacklist + Send + Sync,
{
    async fn revoke(&self, jti: &str, expires_at: Timestamp) -> Result<(), PmTrackError> {
        match self.primary.revoke(jti, expires_at).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, "token blacklist unavailable, revoking in memory");
                self.fallback.revoke(jti, expires_at).await
            }
        }
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, PmTrackError> {
        match self.primary.is_revoked(jti).await {
            Ok(true) => Ok(true),
            Ok(false) => self.fallback.is_revoked(jti).await,
            Err(err) => {
                tracing::warn!(error = %err, "token blacklist unavailable, checking in memory");
                self.fallback.is_revoked(jti).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct Unavailable;

    impl TokenBlacklist for Unavailable {
        async fn revoke(&self, _jti: &str, _expires_at: Timestamp) -> Result<(), PmTrackError> {
            Err(PmTrackError::storage(std::io::Error::other("connection refused")))
        }

        async fn is_revoked(&self, _jti: &str) -> Result<bool, PmTrackError> {
            Err(PmTrackError::storage(std::io::Error::other("connection refused")))
        }
    }

    #[tokio::test]
    async fn should_report_revoked_token_until_expiry() {
        let blacklist = InMemoryTokenBlacklist::new();
        blacklist
            .revoke("abc", now() + Duration::minutes(5))
            .await
            .unwrap();
        assert!(blacklist.is_revoked("abc").await.unwrap());
        assert!(!blacklist.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn should_ignore_already_expired_tokens() {
        let blacklist = InMemoryTokenBlacklist::new();
        blacklist
            .revoke("old", now() - Duration::minutes(1))
            .await
            .unwrap();
        assert!(!blacklist.is_revoked("old").await.unwrap());
        assert!(blacklist.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn should_purge_expired_entries_on_revoke() {
        let blacklist = InMemoryTokenBlacklist::new();
        blacklist
            .entries
            .write()
            .await
            .insert("stale".to_string(), now() - Duration::seconds(1));
        blacklist
            .revoke("fresh", now() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(blacklist.entries.read().await.len(), 1);
    }

    #[tokio::test]
    async fn should_fall_back_when_primary_fails() {
        let blacklist = FallbackTokenBlacklist::new(Unavailable, InMemoryTokenBlacklist::new());
        blacklist
            .revoke("abc", now() + Duration::minutes(5))
            .await
            .unwrap();
        assert!(blacklist.is_revoked("abc").await.unwrap());
        assert!(!blacklist.is_revoked("xyz").await.unwrap());
    }

    #[tokio::test]
    async fn should_check_fallback_when_primary_misses() {
        let fallback = InMemoryTokenBlacklist::new();
        fallback
            .revoke("during-outage", now() + Duration::minutes(5))
            .await
            .unwrap();
        let blacklist = FallbackTokenBlacklist::new(InMemoryTokenBlacklist::new(), fallback);
        assert!(blacklist.is_revoked("during-outage").await.unwrap());
    }
}
