//! Authentication ports: password hashing, token signing, revocation.

use std::future::Future;

use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::session::{IssuedToken, TokenClaims};
use pmtrack_domain::time::Timestamp;
use pmtrack_domain::user::User;

/// One-way password hashing.
pub trait PasswordHasher {
    /// Hash `password` with a fresh salt.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Internal`] when hashing fails.
    fn hash(&self, password: &str) -> Result<String, PmTrackError>;

    /// Check `password` against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Internal`] when `hash` cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PmTrackError>;
}

/// Signs and verifies bearer tokens.
pub trait TokenCodec {
    /// Issue a token for `user` with a fresh `jti`.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Internal`] when signing fails.
    fn issue(&self, user: &User) -> Result<IssuedToken, PmTrackError>;

    /// Verify the signature, issuer and expiry of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Unauthorized`] when the token is malformed,
    /// badly signed, or expired.
    fn decode(&self, token: &str) -> Result<TokenClaims, PmTrackError>;
}

/// Store of revoked token ids.
///
/// An entry only needs to live until the token it revokes would have
/// expired anyway.
pub trait TokenBlacklist {
    fn revoke(
        &self,
        jti: &str,
        expires_at: Timestamp,
    ) -> impl Future<Output = Result<(), PmTrackError>> + Send;

    fn is_revoked(&self, jti: &str) -> impl Future<Output = Result<bool, PmTrackError>> + Send;
}
