//! argon2id password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};

use pmtrack_app::ports::PasswordHasher;
use pmtrack_domain::error::PmTrackError;

use crate::error::AuthAdapterError;

/// Hashes with argon2 default parameters and a fresh random salt.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PmTrackError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(AuthAdapterError::Hash)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PmTrackError> {
        // A stored value that is not a PHC string can never match.
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return Ok(false);
        };
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_verify_matching_password() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash("secret1").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("secret1", &hash).unwrap());
        assert!(!hasher.verify("secret2", &hash).unwrap());
    }

    #[test]
    fn should_salt_each_hash() {
        let hasher = Argon2PasswordHasher;
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn should_not_match_malformed_hash() {
        assert!(!Argon2PasswordHasher.verify("secret1", "plaintext").unwrap());
    }
}
