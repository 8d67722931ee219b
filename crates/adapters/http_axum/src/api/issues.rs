//! Issue endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use pmtrack_app::ports::Ports;
use pmtrack_domain::id::{IssueId, MachineId, RoomId, UserId};
use pmtrack_domain::issue::{Issue, IssueFilter, IssuePatch, IssueStatus, IssueSummary};
use pmtrack_domain::priority::Priority;
use pmtrack_domain::time::Timestamp;

use super::{Created, NoContent, parse_id, parse_optional_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListIssuesQuery {
    pub machine_id: Option<String>,
    pub room_id: Option<String>,
    pub reported_by_id: Option<String>,
    pub assigned_to_id: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    pub is_open: Option<bool>,
}

impl ListIssuesQuery {
    fn filter(&self) -> Result<IssueFilter, ApiError> {
        Ok(IssueFilter {
            machine_id: parse_optional_id("machine", self.machine_id.as_deref())?,
            room_id: parse_optional_id("room", self.room_id.as_deref())?,
            reported_by_id: parse_optional_id("user", self.reported_by_id.as_deref())?,
            assigned_to_id: parse_optional_id("user", self.assigned_to_id.as_deref())?,
            status: self.status,
            priority: self.priority,
            is_open: self.is_open,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateIssueRequest {
    pub machine_id: MachineId,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// Defaults to the caller.
    #[serde(default)]
    pub reported_by_id: Option<UserId>,
    #[serde(default)]
    pub assigned_to_id: Option<UserId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub reported_at: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: IssueStatus,
}

#[derive(Debug, Serialize)]
pub struct OpenDashboard {
    pub open_count: usize,
    pub open_issues: Vec<Issue>,
}

#[derive(Debug, Serialize)]
pub struct CriticalDashboard {
    pub critical_count: usize,
    pub critical_issues: Vec<Issue>,
}

fn issue_id(raw: &str) -> Result<IssueId, ApiError> {
    parse_id("issue", raw)
}

/// `GET /api/v1/issues`
pub async fn list<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<ListIssuesQuery>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let issues = state
        .issues
        .list_issues(&user.actor(), &query.filter()?)
        .await?;
    Ok(Json(issues))
}

/// `POST /api/v1/issues`
pub async fn create<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Json(req): Json<CreateIssueRequest>,
) -> Result<Created<Issue>, ApiError> {
    let actor = user.actor();
    let issue = Issue::builder()
        .machine_id(req.machine_id)
        .room_id(req.room_id)
        .reported_by_id(req.reported_by_id.unwrap_or(actor.user_id))
        .assigned_to_id(req.assigned_to_id)
        .title(req.title)
        .description(req.description)
        .priority(req.priority)
        .reported_at(req.reported_at)
        .build()?;
    Ok(Created(state.issues.create_issue(&actor, issue).await?))
}

/// `GET /api/v1/issues/{id}`
pub async fn get<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Issue>, ApiError> {
    Ok(Json(
        state.issues.get_issue(&user.actor(), issue_id(&id)?).await?,
    ))
}

/// `PUT /api/v1/issues/{id}`
pub async fn update<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<IssuePatch>,
) -> Result<Json<Issue>, ApiError> {
    let issue = state
        .issues
        .update_issue(&user.actor(), issue_id(&id)?, patch)
        .await?;
    Ok(Json(issue))
}

/// `DELETE /api/v1/issues/{id}`
pub async fn delete<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    state
        .issues
        .delete_issue(&user.actor(), issue_id(&id)?)
        .await?;
    Ok(NoContent)
}

/// `PUT /api/v1/issues/{id}/assign`
pub async fn assign<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<Issue>, ApiError> {
    let issue = state
        .issues
        .assign(&user.actor(), issue_id(&id)?, req.assigned_to_id)
        .await?;
    Ok(Json(issue))
}

/// `PUT /api/v1/issues/{id}/status`
pub async fn set_status<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Issue>, ApiError> {
    let issue = state
        .issues
        .set_status(&user.actor(), issue_id(&id)?, req.status)
        .await?;
    Ok(Json(issue))
}

/// `GET /api/v1/issues/dashboard/open-issues`
pub async fn open<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<OpenDashboard>, ApiError> {
    let issues = state.issues.open_issues(&user.actor()).await?;
    Ok(Json(OpenDashboard {
        open_count: issues.len(),
        open_issues: issues,
    }))
}

/// `GET /api/v1/issues/dashboard/critical-issues`
pub async fn critical<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<CriticalDashboard>, ApiError> {
    let issues = state.issues.critical_issues(&user.actor()).await?;
    Ok(Json(CriticalDashboard {
        critical_count: issues.len(),
        critical_issues: issues,
    }))
}

/// `GET /api/v1/issues/stats/summary`
pub async fn summary<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<IssueSummary>, ApiError> {
    Ok(Json(state.issues.summary(&user.actor()).await?))
}
