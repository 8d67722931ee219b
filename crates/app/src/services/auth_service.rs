//! Auth service: registration, login, token verification and revocation.

use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::{AuthError, NotFoundError, PmTrackError, ValidationError};
use pmtrack_domain::id::UserId;
use pmtrack_domain::session::{IssuedToken, TokenClaims};
use pmtrack_domain::time::now;
use pmtrack_domain::user::{User, UserRole};

use crate::ports::{PasswordHasher, TokenBlacklist, TokenCodec, UserRepository};
use crate::services::user_service::{NewUser, check_password, insert_user};

/// A verified bearer token and the account it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub claims: TokenClaims,
}

impl Session {
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::from_user(&self.user)
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Login {
    pub user: User,
    pub token: IssuedToken,
}

/// Application service for authentication.
pub struct AuthService<U, H, C, B> {
    users: U,
    hasher: H,
    tokens: C,
    blacklist: B,
}

impl<U, H, C, B> AuthService<U, H, C, B>
where
    U: UserRepository,
    H: PasswordHasher,
    C: TokenCodec,
    B: TokenBlacklist,
{
    pub fn new(users: U, hasher: H, tokens: C, blacklist: B) -> Self {
        Self {
            users,
            hasher,
            tokens,
            blacklist,
        }
    }

    /// Register an account. Only administrators choose the role; everyone
    /// else gets an active technician account.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] for invalid or duplicate input.
    #[tracing::instrument(skip(self, caller, new_user), fields(username = %new_user.username))]
    pub async fn register(
        &self,
        caller: Option<&Actor>,
        mut new_user: NewUser,
    ) -> Result<User, PmTrackError> {
        if !caller.is_some_and(|actor| actor.can(Permission::ManageUsers)) {
            new_user.role = UserRole::Technician;
            new_user.is_active = true;
        }
        let user = insert_user(&self.users, &self.hasher, new_user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Check credentials and issue a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or a
    /// wrong password and [`AuthError::AccountDeactivated`] for an inactive
    /// account.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Login, PmTrackError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            tracing::warn!("login failed: unknown user");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !self.hasher.verify(password, &user.password_hash)? {
            tracing::warn!("login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active {
            tracing::warn!("login failed: account deactivated");
            return Err(AuthError::AccountDeactivated.into());
        }
        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(Login { user, token })
    }

    /// Resolve a bearer token to a live session.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Unauthorized`] when the token is invalid,
    /// expired or revoked, or its user is gone or deactivated.
    pub async fn authenticate(&self, token: &str) -> Result<Session, PmTrackError> {
        let claims = self.tokens.decode(token)?;
        if self.blacklist.is_revoked(&claims.jti).await? {
            tracing::warn!(jti = %claims.jti, "revoked token presented");
            return Err(AuthError::RevokedToken.into());
        }
        let Some(user) = self.users.get_by_id(claims.user_id).await? else {
            return Err(AuthError::InvalidToken.into());
        };
        if !user.is_active {
            return Err(AuthError::AccountDeactivated.into());
        }
        Ok(Session { user, claims })
    }

    /// Revoke the session's token until it would have expired.
    ///
    /// # Errors
    ///
    /// Returns a storage error when no blacklist could record the revocation.
    #[tracing::instrument(skip(self, session), fields(user_id = %session.user.id))]
    pub async fn logout(&self, session: &Session) -> Result<(), PmTrackError> {
        self.blacklist
            .revoke(&session.claims.jti, session.claims.expires_at)
            .await?;
        tracing::info!("token revoked");
        Ok(())
    }

    /// Replace a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IncorrectPassword`] when `current` does not
    /// match and [`ValidationError::TooShort`] for a short new password.
    #[tracing::instrument(skip(self, current, new_password))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new_password: &str,
    ) -> Result<(), PmTrackError> {
        let mut user = self.users.get_by_id(user_id).await?.ok_or_else(|| {
            PmTrackError::from(NotFoundError {
                entity: "User",
                id: user_id.to_string(),
            })
        })?;
        if !self.hasher.verify(current, &user.password_hash)? {
            tracing::warn!("password change rejected: wrong current password");
            return Err(ValidationError::IncorrectPassword.into());
        }
        check_password(new_password)?;
        user.password_hash = self.hasher.hash(new_password)?;
        user.updated_at = now();
        self.users.update(user).await?;
        tracing::info!("password changed");
        Ok(())
    }
}
