//! Storage-specific error type wrapping sqlx errors.

use pmtrack_domain::error::{PmTrackError, ValidationError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for PmTrackError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Report a unique-constraint violation as the [`ValidationError`] that
/// `conflict` picks from the database message; anything else stays a
/// storage failure.
///
/// The service-level duplicate checks race with concurrent writers, so the
/// constraint is the final word on uniqueness.
pub(crate) fn on_unique_violation(
    err: sqlx::Error,
    conflict: impl FnOnce(&str) -> ValidationError,
) -> PmTrackError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let conflict = conflict(db.message());
            tracing::debug!(error = %conflict, "unique constraint rejected write");
            conflict.into()
        }
        _ => StorageError::from(err).into(),
    }
}
