//! Authentication endpoints.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use pmtrack_app::ports::Ports;
use pmtrack_app::services::auth_service::Session;
use pmtrack_app::services::user_service::NewUser;
use pmtrack_domain::id::UserId;
use pmtrack_domain::time::Timestamp;
use pmtrack_domain::user::{User, UserRole};

use super::{Created, Message};
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registration and for admin user creation.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "active")]
    pub is_active: bool,
    pub password: String,
}

fn active() -> bool {
    true
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            role: req.role,
            is_active: req.is_active,
            password: req.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Profile plus bearer token returned by a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub name: String,
    pub token: String,
    pub expires_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `POST /api/v1/auth/register`
pub async fn register<P: Ports>(
    State(state): State<AppState<P>>,
    MaybeUser(session): MaybeUser,
    Json(req): Json<RegisterRequest>,
) -> Result<Created<User>, ApiError> {
    let caller = session.as_ref().map(Session::actor);
    let user = state.auth.register(caller.as_ref(), req.into()).await?;
    Ok(Created(user))
}

/// `POST /api/v1/auth/login`
pub async fn login<P: Ports>(
    State(state): State<AppState<P>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let login = state.auth.login(&req.username, &req.password).await?;
    let user = login.user;
    Ok(Json(LoginResponse {
        id: user.id,
        name: user.full_name(),
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        role: user.role,
        token: login.token.token,
        expires_at: login.token.expires_at,
    }))
}

/// `GET /api/v1/auth/me`
pub async fn me(CurrentUser(session): CurrentUser) -> Json<User> {
    Json(session.user)
}

/// `POST /api/v1/auth/logout`
pub async fn logout<P: Ports>(
    State(state): State<AppState<P>>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Message>, ApiError> {
    state.auth.logout(&session).await?;
    Ok(Json(Message {
        message: "successfully logged out",
    }))
}

/// `POST /api/v1/auth/change-password`
pub async fn change_password<P: Ports>(
    State(state): State<AppState<P>>,
    CurrentUser(session): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Message>, ApiError> {
    state
        .auth
        .change_password(session.user.id, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(Message {
        message: "password changed successfully",
    }))
}

/// `GET /api/v1/auth/verify-token`
pub async fn verify_token(CurrentUser(_): CurrentUser) -> Json<Message> {
    Json(Message {
        message: "token is valid",
    })
}
