//! HS256 bearer tokens.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use pmtrack_app::ports::TokenCodec;
use pmtrack_domain::error::{AuthError, PmTrackError};
use pmtrack_domain::id::UserId;
use pmtrack_domain::session::{IssuedToken, TokenClaims};
use pmtrack_domain::time::{from_unix_seconds, now};
use pmtrack_domain::user::{User, UserRole};

use crate::error::AuthAdapterError;

/// Signing configuration for [`JwtTokenCodec`].
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret, at least [`JwtConfig::MIN_SECRET_LEN`] bytes.
    pub secret: String,
    /// Lifetime of issued tokens.
    pub ttl_minutes: i64,
    /// Value of the `iss` claim, checked on decode.
    pub issuer: String,
}

impl JwtConfig {
    pub const MIN_SECRET_LEN: usize = 32;
    pub const DEFAULT_TTL_MINUTES: i64 = 30;
    /// One year.
    pub const MAX_TTL_MINUTES: i64 = 525_600;
    pub const DEFAULT_ISSUER: &'static str = "pmtrack";

    /// Config with the default lifetime and issuer.
    #[must_use]
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_minutes: Self::DEFAULT_TTL_MINUTES,
            issuer: Self::DEFAULT_ISSUER.to_string(),
        }
    }
}

/// Wire layout of the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: String,
    role: String,
    iat: i64,
    exp: i64,
    iss: String,
}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    issuer: String,
}

impl std::fmt::Debug for JwtTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenCodec")
            .field("ttl", &self.ttl)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtTokenCodec {
    /// Build a codec from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthAdapterError::WeakSecret`] when the secret is too short
    /// and [`AuthAdapterError::InvalidLifetime`] when the lifetime is not
    /// within `1..=MAX_TTL_MINUTES`.
    pub fn new(config: JwtConfig) -> Result<Self, AuthAdapterError> {
        if config.secret.len() < JwtConfig::MIN_SECRET_LEN {
            return Err(AuthAdapterError::WeakSecret {
                min: JwtConfig::MIN_SECRET_LEN,
            });
        }
        if !(1..=JwtConfig::MAX_TTL_MINUTES).contains(&config.ttl_minutes) {
            return Err(AuthAdapterError::InvalidLifetime {
                minutes: config.ttl_minutes,
                max: JwtConfig::MAX_TTL_MINUTES,
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: Duration::minutes(config.ttl_minutes),
            issuer: config.issuer,
        })
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, user: &User) -> Result<IssuedToken, PmTrackError> {
        let issued_at = now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(AuthAdapterError::ExpiryOutOfRange)?;
        let jti = uuid::Uuid::new_v4().to_string();
        let claims = Claims {
            sub: user.id.to_string(),
            jti: jti.clone(),
            role: user.role.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthAdapterError::Encode)?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, PmTrackError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                kind => {
                    tracing::debug!(?kind, "rejected bearer token");
                    AuthError::InvalidToken
                }
            }
        })?;
        let claims = data.claims;

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidToken)?;
        let role = claims
            .role
            .parse::<UserRole>()
            .map_err(|_| AuthError::InvalidToken)?;
        let issued_at = from_unix_seconds(claims.iat).ok_or(AuthError::InvalidToken)?;
        let expires_at = from_unix_seconds(claims.exp).ok_or(AuthError::InvalidToken)?;

        Ok(TokenClaims {
            user_id,
            jti: claims.jti,
            role,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn codec() -> JwtTokenCodec {
        JwtTokenCodec::new(JwtConfig::with_secret(SECRET)).unwrap()
    }

    fn user() -> User {
        User::builder()
            .username("alice")
            .email("alice@example.com")
            .first_name("Alice")
            .last_name("Smith")
            .role(UserRole::Supervisor)
            .password_hash("x")
            .build()
            .unwrap()
    }

    fn forged(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn should_decode_what_it_issues() {
        let codec = codec();
        let user = user();

        let issued = codec.issue(&user).unwrap();
        let claims = codec.decode(&issued.token).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.role, UserRole::Supervisor);
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.expires_at.timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn should_give_every_token_a_distinct_id() {
        let codec = codec();
        let user = user();
        let first = codec.issue(&user).unwrap();
        let second = codec.issue(&user).unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn should_reject_weak_secret() {
        assert!(matches!(
            JwtTokenCodec::new(JwtConfig::with_secret("short")),
            Err(AuthAdapterError::WeakSecret { min: 32 })
        ));
    }

    #[test]
    fn should_reject_non_positive_lifetime() {
        let config = JwtConfig {
            ttl_minutes: 0,
            ..JwtConfig::with_secret(SECRET)
        };
        assert!(matches!(
            JwtTokenCodec::new(config),
            Err(AuthAdapterError::InvalidLifetime { minutes: 0, .. })
        ));
    }

    #[test]
    fn should_reject_lifetime_beyond_one_year() {
        for minutes in [JwtConfig::MAX_TTL_MINUTES + 1, 200_000_000_000, i64::MAX] {
            let config = JwtConfig {
                ttl_minutes: minutes,
                ..JwtConfig::with_secret(SECRET)
            };
            assert!(matches!(
                JwtTokenCodec::new(config),
                Err(AuthAdapterError::InvalidLifetime { max: 525_600, .. })
            ));
        }
    }

    #[test]
    fn should_issue_token_with_longest_accepted_lifetime() {
        let codec = JwtTokenCodec::new(JwtConfig {
            ttl_minutes: JwtConfig::MAX_TTL_MINUTES,
            ..JwtConfig::with_secret(SECRET)
        })
        .unwrap();
        let issued = codec.issue(&user()).unwrap();
        assert!(issued.expires_at > now() + Duration::days(364));
    }

    #[test]
    fn should_report_overflowing_expiry_as_error() {
        let codec = JwtTokenCodec {
            ttl: Duration::MAX,
            ..codec()
        };
        assert!(matches!(
            codec.issue(&user()),
            Err(PmTrackError::Internal(_))
        ));
    }

    #[test]
    fn should_report_expired_token() {
        let issued_at = now() - Duration::hours(2);
        let claims = Claims {
            sub: UserId::new().to_string(),
            jti: "expired".to_string(),
            role: "TECHNICIAN".to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::minutes(30)).timestamp(),
            iss: JwtConfig::DEFAULT_ISSUER.to_string(),
        };

        let result = codec().decode(&forged(&claims, SECRET));
        assert!(matches!(
            result,
            Err(PmTrackError::Unauthorized(AuthError::ExpiredToken))
        ));
    }

    #[test]
    fn should_reject_token_signed_with_other_secret() {
        let issued = JwtTokenCodec::new(JwtConfig::with_secret("another-secret-of-at-least-32-bytes!"))
            .unwrap()
            .issue(&user())
            .unwrap();

        assert!(matches!(
            codec().decode(&issued.token),
            Err(PmTrackError::Unauthorized(AuthError::InvalidToken))
        ));
    }

    #[test]
    fn should_reject_foreign_issuer_and_garbage() {
        let claims = Claims {
            sub: UserId::new().to_string(),
            jti: "x".to_string(),
            role: "ADMIN".to_string(),
            iat: now().timestamp(),
            exp: (now() + Duration::minutes(5)).timestamp(),
            iss: "someone-else".to_string(),
        };

        assert!(codec().decode(&forged(&claims, SECRET)).is_err());
        assert!(matches!(
            codec().decode("not.a.jwt"),
            Err(PmTrackError::Unauthorized(AuthError::InvalidToken))
        ));
    }

    #[test]
    fn should_reject_unknown_role_in_valid_signature() {
        let claims = Claims {
            sub: UserId::new().to_string(),
            jti: "x".to_string(),
            role: "OVERLORD".to_string(),
            iat: now().timestamp(),
            exp: (now() + Duration::minutes(5)).timestamp(),
            iss: JwtConfig::DEFAULT_ISSUER.to_string(),
        };

        assert!(matches!(
            codec().decode(&forged(&claims, SECRET)),
            Err(PmTrackError::Unauthorized(AuthError::InvalidToken))
        ));
    }
}
