//! User administration endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use pmtrack_app::ports::Ports;
use pmtrack_domain::id::UserId;
use pmtrack_domain::user::{User, UserPatch};

use super::auth::RegisterRequest;
use super::{Created, NoContent, parse_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// `GET /api/v1/users`
pub async fn list<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state
        .users
        .list_users(&user.actor(), query.include_inactive)
        .await?;
    Ok(Json(users))
}

/// `POST /api/v1/users`
pub async fn create<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Json(req): Json<RegisterRequest>,
) -> Result<Created<User>, ApiError> {
    let created = state.users.create_user(&user.actor(), req.into()).await?;
    Ok(Created(created))
}

/// `GET /api/v1/users/{id}`
pub async fn get<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id("user", &id)?;
    Ok(Json(state.users.get_user(&user.actor(), id).await?))
}

/// `PUT /api/v1/users/{id}`
pub async fn update<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id("user", &id)?;
    Ok(Json(state.users.update_user(&user.actor(), id, patch).await?))
}

/// `DELETE /api/v1/users/{id}` deactivates the account.
pub async fn delete<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    let id: UserId = parse_id("user", &id)?;
    state.users.deactivate_user(&user.actor(), id).await?;
    Ok(NoContent)
}
