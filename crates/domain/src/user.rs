//! User: an account that signs in and acts on maintenance records.

use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::UserId;
use crate::time::{Timestamp, now};
use crate::validate;

string_enum! {
    /// Access level of a user, ordered from least to most privileged.
    #[derive(PartialOrd, Ord, Default)]
    UserRole {
        #[default]
        Technician => "TECHNICIAN",
        Supervisor => "SUPERVISOR",
        Manager => "MANAGER",
        Admin => "ADMIN",
    }
}

/// A person with an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub const USERNAME_MIN: usize = 3;
    pub const USERNAME_MAX: usize = 50;
    pub const EMAIL_MAX: usize = 100;
    pub const NAME_MAX: usize = 50;
    pub const PHONE_MAX: usize = 20;

    /// Create a builder for constructing a [`User`].
    #[must_use]
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    /// "First Last", as shown in listings and login responses.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when a field is empty, too long,
    /// or the email address is malformed.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("username", &self.username, Self::USERNAME_MAX)?;
        if self.username.chars().count() < Self::USERNAME_MIN {
            return Err(ValidationError::TooShort {
                field: "username",
                min: Self::USERNAME_MIN,
            }
            .into());
        }
        validate::required("email", &self.email, Self::EMAIL_MAX)?;
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidEmail.into());
        }
        validate::required("first_name", &self.first_name, Self::NAME_MAX)?;
        validate::required("last_name", &self.last_name, Self::NAME_MAX)?;
        validate::optional("phone", self.phone.as_deref(), Self::PHONE_MAX)?;
        Ok(())
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the patched user is invalid.
    pub fn apply(&mut self, patch: UserPatch) -> Result<(), PmTrackError> {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now();
        self.validate()
    }
}

/// Partial update of a [`User`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Whether the patch touches fields only an administrator may change.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

/// Step-by-step builder for [`User`].
#[derive(Debug, Default)]
pub struct UserBuilder {
    id: Option<UserId>,
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    role: Option<UserRole>,
    is_active: Option<bool>,
    password_hash: Option<String>,
}

impl UserBuilder {
    #[must_use]
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    #[must_use]
    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }

    #[must_use]
    pub fn role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = Some(password_hash.into());
        self
    }

    /// Consume the builder, validate, and return a [`User`].
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if any field breaks an invariant.
    pub fn build(self) -> Result<User, PmTrackError> {
        let created_at = now();
        let user = User {
            id: self.id.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            phone: self.phone,
            role: self.role.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            password_hash: self.password_hash.unwrap_or_default(),
            created_at,
            updated_at: created_at,
        };
        user.validate()?;
        Ok(user)
    }
}
