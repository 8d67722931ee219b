//! Common error types used across the workspace.
//!
//! Every layer reports failures as a [`PmTrackError`]. Typed sub-errors
//! convert into it via `#[from]`; adapters box their own errors into the
//! [`PmTrackError::Storage`] and [`PmTrackError::Internal`] variants.

use std::error::Error as StdError;

use crate::access::Permission;
use crate::job::JobStatus;

/// Boxed source error carried by infrastructure failures.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Top-level error for every pmtrack operation.
#[derive(Debug, thiserror::Error)]
pub enum PmTrackError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),

    #[error("storage error")]
    Storage(#[source] BoxError),

    #[error("internal error")]
    Internal(#[source] BoxError),
}

/// Rejected input: malformed fields, duplicates, or illegal state changes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("{0} must be at least 1")]
    NotPositive(&'static str),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("next due date is out of range")]
    DueDateOutOfRange,

    #[error("email address is invalid")]
    InvalidEmail,

    #[error("invalid {kind} id: {value}")]
    InvalidId { kind: &'static str, value: String },

    #[error("limit must be between 1 and {max}")]
    InvalidLimit { max: u32 },

    #[error("username already registered")]
    UsernameTaken,

    #[error("email already registered")]
    EmailTaken,

    #[error("serial number already exists")]
    SerialNumberTaken,

    #[error("room does not belong to the specified property")]
    RoomNotInProperty,

    #[error("user is already assigned to this job")]
    AlreadyAssigned,

    #[error("cannot change job status from {from} to {to}")]
    InvalidJobTransition { from: JobStatus, to: JobStatus },

    #[error("current password is incorrect")]
    IncorrectPassword,

    #[error(transparent)]
    UnknownValue(#[from] ParseEnumError),
}

/// A referenced record does not exist.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// The caller could not be authenticated.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("could not validate credentials")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token has been revoked")]
    RevokedToken,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is deactivated")]
    AccountDeactivated,
}

/// The caller is authenticated but not allowed to do this.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ForbiddenError {
    #[error("permission denied: {0} required")]
    MissingPermission(Permission),

    #[error("only users assigned to this job may update it")]
    NotAssigned,

    #[error("technicians may only change the status of a job")]
    StatusOnly,

    #[error("cannot change your own role or active status")]
    SelfEscalation,
}

/// A stored or transmitted string is not a known enum value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl PmTrackError {
    /// Wrap an infrastructure failure raised by a persistence adapter.
    pub fn storage(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    /// Wrap an unexpected infrastructure failure.
    pub fn internal(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Internal(Box::new(err))
    }
}
