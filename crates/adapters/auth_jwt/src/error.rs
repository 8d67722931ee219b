//! Errors raised while configuring or running the credential adapter.

use pmtrack_domain::error::PmTrackError;

#[derive(Debug, thiserror::Error)]
pub enum AuthAdapterError {
    /// The signing secret is shorter than the accepted minimum.
    #[error("token secret must be at least {min} bytes")]
    WeakSecret { min: usize },

    /// The token lifetime is not positive or exceeds the maximum.
    #[error("token lifetime must be between 1 and {max} minutes, got {minutes}")]
    InvalidLifetime { minutes: i64, max: i64 },

    /// The expiry of a token falls outside the representable time range.
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,

    #[error("unable to sign token")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("unable to hash password")]
    Hash(#[source] argon2::password_hash::Error),
}

impl From<AuthAdapterError> for PmTrackError {
    fn from(err: AuthAdapterError) -> Self {
        Self::internal(err)
    }
}
