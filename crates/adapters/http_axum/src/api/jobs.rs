//! Job endpoints, including multi-user assignment.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use pmtrack_app::ports::Ports;
use pmtrack_app::services::job_service::{JobDetails, NewAssignment};
use pmtrack_domain::assignment::{AssignmentPatch, JobUserAssignment};
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::{AssignmentId, JobId, PropertyId, RoomId, TopicId, UserId};
use pmtrack_domain::job::{Job, JobFilter, JobPatch, JobStatus};
use pmtrack_domain::page::Page;
use pmtrack_domain::priority::Priority;

use super::{Created, NoContent, parse_id, parse_optional_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string of `GET /jobs`. Ids arrive as strings so malformed values
/// surface as validation errors.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<JobStatus>,
    pub property_id: Option<String>,
    pub room_id: Option<String>,
    pub topic_id: Option<String>,
    pub created_by_id: Option<String>,
    pub assigned_user_id: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl ListJobsQuery {
    fn filter(&self) -> Result<JobFilter, ApiError> {
        Ok(JobFilter {
            status: self.status,
            property_id: parse_optional_id("property", self.property_id.as_deref())?,
            room_id: parse_optional_id("room", self.room_id.as_deref())?,
            topic_id: parse_optional_id("topic", self.topic_id.as_deref())?,
            created_by_id: parse_optional_id("user", self.created_by_id.as_deref())?,
            assigned_user_id: parse_optional_id("user", self.assigned_user_id.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignedJobsQuery {
    pub status: Option<JobStatus>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

fn page(skip: Option<u32>, limit: Option<u32>) -> Result<Page, ApiError> {
    Page::new(skip, limit).map_err(|err| ApiError::from(PmTrackError::from(err)))
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topic_id: Option<TopicId>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub property_id: PropertyId,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub before_image: Option<String>,
    #[serde(default)]
    pub after_image: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<i64>,
    #[serde(default)]
    pub actual_hours: Option<i64>,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub role_in_job: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A job with its active assignments inlined.
#[derive(Debug, Serialize)]
pub struct JobWithAssignments {
    #[serde(flatten)]
    pub job: Job,
    pub assignments: Vec<JobUserAssignment>,
}

impl From<JobDetails> for JobWithAssignments {
    fn from(details: JobDetails) -> Self {
        Self {
            job: details.job,
            assignments: details.assignments,
        }
    }
}

fn job_id(raw: &str) -> Result<JobId, ApiError> {
    parse_id("job", raw)
}

/// `GET /api/v1/jobs`
pub async fn list<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let filter = query.filter()?;
    let page = page(query.skip, query.limit)?;
    let jobs = state.jobs.list_jobs(&user.actor(), &filter, page).await?;
    Ok(Json(jobs))
}

/// `POST /api/v1/jobs`
pub async fn create<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<Created<Job>, ApiError> {
    let actor = user.actor();
    let job = Job::builder()
        .title(req.title)
        .description(req.description)
        .topic_id(req.topic_id)
        .room_id(req.room_id)
        .property_id(req.property_id)
        .status(req.status)
        .created_by_id(actor.user_id)
        .before_image(req.before_image)
        .after_image(req.after_image)
        .estimated_hours(req.estimated_hours)
        .actual_hours(req.actual_hours)
        .priority(req.priority)
        .build()?;
    Ok(Created(state.jobs.create_job(&actor, job).await?))
}

/// `GET /api/v1/jobs/{id}`
pub async fn get<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<JobWithAssignments>, ApiError> {
    let details = state.jobs.get_job(&user.actor(), job_id(&id)?).await?;
    Ok(Json(details.into()))
}

/// `PUT /api/v1/jobs/{id}`
pub async fn update<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<Job>, ApiError> {
    let job = state
        .jobs
        .update_job(&user.actor(), job_id(&id)?, patch)
        .await?;
    Ok(Json(job))
}

/// `DELETE /api/v1/jobs/{id}` removes the job and its assignments.
pub async fn delete<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    state.jobs.delete_job(&user.actor(), job_id(&id)?).await?;
    Ok(NoContent)
}

/// `GET /api/v1/jobs/{id}/assignments`
pub async fn list_assignments<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<JobUserAssignment>>, ApiError> {
    let assignments = state
        .jobs
        .list_assignments(&user.actor(), job_id(&id)?)
        .await?;
    Ok(Json(assignments))
}

/// `POST /api/v1/jobs/{id}/assignments`
pub async fn assign<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> Result<Created<JobUserAssignment>, ApiError> {
    let request = NewAssignment {
        user_id: req.user_id,
        role_in_job: req.role_in_job,
        notes: req.notes,
        assigned_by_id: None,
    };
    let assignment = state
        .jobs
        .assign_user(&user.actor(), job_id(&id)?, request)
        .await?;
    Ok(Created(assignment))
}

/// `GET /api/v1/jobs/{id}/history`
pub async fn history<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<JobUserAssignment>>, ApiError> {
    let history = state.jobs.job_history(&user.actor(), job_id(&id)?).await?;
    Ok(Json(history))
}

/// `PUT /api/v1/jobs/assignments/{assignment_id}`
pub async fn update_assignment<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<AssignmentPatch>,
) -> Result<Json<JobUserAssignment>, ApiError> {
    let id: AssignmentId = parse_id("assignment", &id)?;
    let assignment = state
        .jobs
        .update_assignment(&user.actor(), id, patch)
        .await?;
    Ok(Json(assignment))
}

/// `DELETE /api/v1/jobs/assignments/{assignment_id}` deactivates the assignment.
pub async fn remove_assignment<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    let id: AssignmentId = parse_id("assignment", &id)?;
    state.jobs.remove_assignment(&user.actor(), id).await?;
    Ok(NoContent)
}

/// `GET /api/v1/jobs/user/{user_id}/assigned`
pub async fn assigned_to_user<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    Query(query): Query<AssignedJobsQuery>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let user_id: UserId = parse_id("user", &user_id)?;
    let page = page(query.skip, query.limit)?;
    let jobs = state
        .jobs
        .jobs_for_user(&user.actor(), user_id, query.status, page)
        .await?;
    Ok(Json(jobs))
}
