//! Authenticated sessions backed by signed bearer tokens.

use serde::Serialize;

use crate::id::UserId;
use crate::time::Timestamp;
use crate::user::UserRole;

/// Verified contents of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: UserId,
    /// Unique token id, used as the revocation key.
    pub jti: String,
    pub role: UserRole,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

/// A freshly signed token handed back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(skip)]
    pub jti: String,
    pub expires_at: Timestamp,
}
