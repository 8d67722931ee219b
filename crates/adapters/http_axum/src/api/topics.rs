//! Maintenance topic endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use pmtrack_app::ports::Ports;
use pmtrack_domain::id::TopicId;
use pmtrack_domain::topic::{Topic, TopicPatch};

use super::properties::ActiveQuery;
use super::{Created, NoContent, parse_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET /api/v1/topics`
pub async fn list<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<Vec<Topic>>, ApiError> {
    let topics = state
        .topics
        .list_topics(&user.actor(), query.is_active)
        .await?;
    Ok(Json(topics))
}

/// `POST /api/v1/topics`
pub async fn create<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Json(req): Json<CreateTopicRequest>,
) -> Result<Created<Topic>, ApiError> {
    let topic = Topic::new(req.title, req.description)?;
    Ok(Created(state.topics.create_topic(&user.actor(), topic).await?))
}

/// `GET /api/v1/topics/{id}`
pub async fn get<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Topic>, ApiError> {
    let id: TopicId = parse_id("topic", &id)?;
    Ok(Json(state.topics.get_topic(&user.actor(), id).await?))
}

/// `PUT /api/v1/topics/{id}`
pub async fn update<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<TopicPatch>,
) -> Result<Json<Topic>, ApiError> {
    let id: TopicId = parse_id("topic", &id)?;
    Ok(Json(
        state.topics.update_topic(&user.actor(), id, patch).await?,
    ))
}

/// `DELETE /api/v1/topics/{id}`
pub async fn delete<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    let id: TopicId = parse_id("topic", &id)?;
    state.topics.delete_topic(&user.actor(), id).await?;
    Ok(NoContent)
}
