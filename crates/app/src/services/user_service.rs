//! User service: account administration and self-service profile edits.

use chrono::Duration;
use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::{ForbiddenError, NotFoundError, PmTrackError, ValidationError};
use pmtrack_domain::id::UserId;
use pmtrack_domain::time::now;
use pmtrack_domain::user::{User, UserPatch, UserRole};

use crate::ports::{PasswordHasher, UserRepository};
use crate::stats::{UserStats, count_by_role};

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Longest idle period accepted by [`UserService::deactivate_inactive`].
pub const MAX_DAYS_INACTIVE: i64 = 36_500;

/// Input for creating an account. The password is hashed before storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub password: String,
}

pub(crate) fn check_password(password: &str) -> Result<(), PmTrackError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password",
            min: MIN_PASSWORD_LEN,
        }
        .into());
    }
    Ok(())
}

/// Validate, check uniqueness, hash and store a new account.
pub(crate) async fn insert_user<U, H>(
    repo: &U,
    hasher: &H,
    new_user: NewUser,
) -> Result<User, PmTrackError>
where
    U: UserRepository,
    H: PasswordHasher,
{
    check_password(&new_user.password)?;
    if repo.find_by_username(&new_user.username).await?.is_some() {
        return Err(ValidationError::UsernameTaken.into());
    }
    if repo.find_by_email(&new_user.email).await?.is_some() {
        return Err(ValidationError::EmailTaken.into());
    }
    let user = User::builder()
        .username(new_user.username)
        .email(new_user.email)
        .first_name(new_user.first_name)
        .last_name(new_user.last_name)
        .phone(new_user.phone)
        .role(new_user.role)
        .is_active(new_user.is_active)
        .password_hash(hasher.hash(&new_user.password)?)
        .build()?;
    repo.create(user).await
}

/// Application service for user accounts.
pub struct UserService<U, H> {
    repo: U,
    hasher: H,
}

impl<U: UserRepository, H: PasswordHasher> UserService<U, H> {
    /// Create a new service backed by the given repository and hasher.
    pub fn new(repo: U, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// List users. Inactive accounts are only included for administrators.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ViewRecords`, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn list_users(
        &self,
        actor: &Actor,
        include_inactive: bool,
    ) -> Result<Vec<User>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        let include_inactive = include_inactive && actor.can(Permission::ManageUsers);
        let users = self.repo.get_all().await?;
        Ok(users
            .into_iter()
            .filter(|user| include_inactive || user.is_active)
            .collect())
    }

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when no user with `id` exists.
    pub async fn get_user(&self, actor: &Actor, id: UserId) -> Result<User, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find(id).await
    }

    /// Create an account with any role.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] for non-administrators and
    /// [`PmTrackError::Validation`] for invalid or duplicate input.
    #[tracing::instrument(skip(self, actor, new_user), fields(actor = %actor.username, username = %new_user.username))]
    pub async fn create_user(&self, actor: &Actor, new_user: NewUser) -> Result<User, PmTrackError> {
        actor.authorize(Permission::ManageUsers)?;
        let user = insert_user(&self.repo, &self.hasher, new_user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Update a profile. Users may edit their own profile except for
    /// `role` and `is_active`; administrators may edit anyone.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] when editing someone else or a
    /// privileged field without `ManageUsers`, [`PmTrackError::NotFound`]
    /// for an unknown user, and [`PmTrackError::Validation`] for invalid or
    /// duplicate values.
    #[tracing::instrument(skip(self, actor, patch), fields(actor = %actor.username))]
    pub async fn update_user(
        &self,
        actor: &Actor,
        id: UserId,
        patch: UserPatch,
    ) -> Result<User, PmTrackError> {
        if !actor.is(id) {
            actor.authorize(Permission::ManageUsers)?;
        } else if patch.is_privileged() && !actor.can(Permission::ManageUsers) {
            tracing::warn!(user_id = %id, "self-escalation attempt rejected");
            return Err(ForbiddenError::SelfEscalation.into());
        }

        let mut user = self.find(id).await?;
        if let Some(username) = patch.username.as_deref().filter(|name| *name != user.username)
            && self.repo.find_by_username(username).await?.is_some()
        {
            return Err(ValidationError::UsernameTaken.into());
        }
        if let Some(email) = patch.email.as_deref().filter(|email| *email != user.email)
            && self.repo.find_by_email(email).await?.is_some()
        {
            return Err(ValidationError::EmailTaken.into());
        }
        user.apply(patch)?;
        self.repo.update(user).await
    }

    /// Soft delete an account.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] for non-administrators and
    /// [`PmTrackError::NotFound`] for an unknown user.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn deactivate_user(&self, actor: &Actor, id: UserId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageUsers)?;
        let mut user = self.find(id).await?;
        user.apply(UserPatch {
            is_active: Some(false),
            ..UserPatch::default()
        })?;
        self.repo.update(user).await?;
        Ok(())
    }

    /// Deactivate every active account not updated in the last
    /// `days_inactive` days, except the caller's. Returns how many were
    /// deactivated.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] for non-administrators and
    /// [`ValidationError::OutOfRange`] unless `days_inactive` is within
    /// `1..=MAX_DAYS_INACTIVE`.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn deactivate_inactive(
        &self,
        actor: &Actor,
        days_inactive: i64,
    ) -> Result<u64, PmTrackError> {
        actor.authorize(Permission::ManageUsers)?;
        let cutoff = Duration::try_days(days_inactive)
            .filter(|_| (1..=MAX_DAYS_INACTIVE).contains(&days_inactive))
            .and_then(|idle| now().checked_sub_signed(idle))
            .ok_or(ValidationError::OutOfRange {
                field: "days_inactive",
                min: 1,
                max: MAX_DAYS_INACTIVE,
            })?;

        let mut deactivated = 0;
        for mut user in self.repo.get_all().await? {
            if !user.is_active || user.updated_at >= cutoff || actor.is(user.id) {
                continue;
            }
            user.apply(UserPatch {
                is_active: Some(false),
                ..UserPatch::default()
            })?;
            self.repo.update(user).await?;
            deactivated += 1;
        }
        tracing::info!(deactivated, days_inactive, "inactive users deactivated");
        Ok(deactivated)
    }

    /// Number of accounts per role, deactivated ones included.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] for non-administrators.
    pub async fn users_by_role(&self, actor: &Actor) -> Result<Vec<(UserRole, u64)>, PmTrackError> {
        actor.authorize(Permission::ManageUsers)?;
        let users = self.repo.get_all().await?;
        Ok(count_by_role(&users))
    }

    /// Account counters for the admin overview.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ViewStatistics`.
    pub async fn stats(&self, actor: &Actor) -> Result<UserStats, PmTrackError> {
        actor.authorize(Permission::ViewStatistics)?;
        let users = self.repo.get_all().await?;
        Ok(UserStats::from_users(&users))
    }

    /// Create the first administrator when no account exists yet.
    ///
    /// Returns `None` when the database already has users.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] for an invalid account, or a
    /// storage error from the repository.
    pub async fn bootstrap_admin(&self, mut new_user: NewUser) -> Result<Option<User>, PmTrackError> {
        if !self.repo.get_all().await?.is_empty() {
            return Ok(None);
        }
        new_user.role = UserRole::Admin;
        new_user.is_active = true;
        let user = insert_user(&self.repo, &self.hasher, new_user).await?;
        tracing::info!(username = %user.username, "initial administrator created");
        Ok(Some(user))
    }

    async fn find(&self, id: UserId) -> Result<User, PmTrackError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "User",
                id: id.to_string(),
            }
            .into()
        })
    }
}
