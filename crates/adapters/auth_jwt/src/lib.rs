//! # pmtrack-adapter-auth-jwt
//!
//! Credential adapter for the auth ports of `pmtrack-app`.
//!
//! - [`JwtTokenCodec`] implements `TokenCodec` with HS256-signed JWTs
//!   carrying the user id, role and a unique token id (`jti`).
//! - [`Argon2PasswordHasher`] implements `PasswordHasher` with argon2id
//!   PHC strings.

pub mod error;
pub mod jwt;
pub mod password;

pub use error::AuthAdapterError;
pub use jwt::{JwtConfig, JwtTokenCodec};
pub use password::Argon2PasswordHasher;
