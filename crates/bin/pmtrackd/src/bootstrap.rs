//! First-start provisioning.

use pmtrack_adapter_http_axum::AppState;
use pmtrack_app::ports::Ports;
use pmtrack_app::services::user_service::NewUser;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::user::{User, UserRole};

use crate::config::AuthConfig;

/// Create the configured administrator when the user table is empty.
///
/// Does nothing when no admin password is configured.
///
/// # Errors
///
/// Returns [`PmTrackError::Validation`] when the configured account is
/// invalid, or a storage error.
pub async fn ensure_admin<P: Ports>(
    state: &AppState<P>,
    auth: &AuthConfig,
) -> Result<Option<User>, PmTrackError> {
    let Some(password) = auth.admin_password.clone() else {
        tracing::debug!("no admin password configured, skipping bootstrap");
        return Ok(None);
    };
    state
        .users
        .bootstrap_admin(NewUser {
            username: auth.admin_username.clone(),
            email: auth.admin_email.clone(),
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            phone: None,
            role: UserRole::Admin,
            is_active: true,
            password,
        })
        .await
}
