//! Admin panel job pages.

use std::collections::HashMap;

use askama::Template;
use axum::Form;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use pmtrack_app::ports::Ports;
use pmtrack_domain::error::{PmTrackError, ValidationError};
use pmtrack_domain::id::JobId;
use pmtrack_domain::job::{Job, JobFilter, JobStatus};
use pmtrack_domain::page::Page;

use super::{PanelError, display_optional, display_time};
use crate::auth::AdminSession;
use crate::state::AppState;

/// `?status=` filter; an empty value selects every status.
#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

fn parse_status(raw: &str) -> Result<Option<JobStatus>, PmTrackError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|err| ValidationError::from(err).into())
}

fn parse_job_id(raw: &str) -> Result<JobId, PmTrackError> {
    raw.parse().map_err(|_| {
        ValidationError::InvalidId {
            kind: "job",
            value: raw.to_string(),
        }
        .into()
    })
}

pub struct JobRow {
    pub id: String,
    pub title: String,
    pub status: &'static str,
    pub priority: &'static str,
    pub created: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            title: job.title.clone(),
            status: job.status.as_str(),
            priority: job.priority.as_str(),
            created: display_time(job.created_at),
        }
    }
}

pub struct AssignmentRow {
    pub user: String,
    pub role_in_job: String,
    pub notes: String,
    pub assigned: String,
}

/// Job list page template.
#[derive(Template)]
#[template(path = "jobs.html")]
pub struct JobsTemplate {
    username: String,
    statuses: Vec<StatusOption>,
    jobs: Vec<JobRow>,
}

impl IntoResponse for JobsTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// Job detail page template.
#[derive(Template)]
#[template(path = "job_detail.html")]
pub struct JobDetailTemplate {
    username: String,
    job: JobRow,
    description: String,
    started: String,
    completed: String,
    /// Completed and cancelled jobs get no status form.
    closed: bool,
    statuses: Vec<StatusOption>,
    assignments: Vec<AssignmentRow>,
}

impl IntoResponse for JobDetailTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// A `<option>` of the status selectors.
pub struct StatusOption {
    pub name: &'static str,
    pub selected: bool,
}

fn status_options(selected: Option<JobStatus>) -> Vec<StatusOption> {
    JobStatus::ALL
        .iter()
        .map(|status| StatusOption {
            name: status.as_str(),
            selected: Some(*status) == selected,
        })
        .collect()
}

/// Options for the status form: the current status and every status it
/// can move to.
fn next_status_options(current: JobStatus) -> Vec<StatusOption> {
    status_options(Some(current))
        .into_iter()
        .zip(JobStatus::ALL)
        .filter(|(_, status)| current.can_transition_to(**status))
        .map(|(option, _)| option)
        .collect()
}

/// `GET /admin/jobs`
pub async fn list<P: Ports>(
    State(state): State<AppState<P>>,
    session: AdminSession,
    Query(query): Query<JobsQuery>,
) -> Result<JobsTemplate, PanelError> {
    let status = parse_status(&query.status)?;
    let filter = JobFilter {
        status,
        ..JobFilter::default()
    };
    let jobs = state
        .jobs
        .list_jobs(&session.actor(), &filter, Page::default())
        .await?;
    Ok(JobsTemplate {
        username: session.0.user.username,
        statuses: status_options(status),
        jobs: jobs.iter().map(JobRow::from).collect(),
    })
}

/// `GET /admin/jobs/{id}`
pub async fn detail<P: Ports>(
    State(state): State<AppState<P>>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<JobDetailTemplate, PanelError> {
    let actor = session.actor();
    let details = state.jobs.get_job(&actor, parse_job_id(&id)?).await?;
    let names: HashMap<_, _> = state
        .users
        .list_users(&actor, true)
        .await?
        .into_iter()
        .map(|user| (user.id, user.username))
        .collect();
    let assignments = details
        .assignments
        .iter()
        .map(|assignment| AssignmentRow {
            user: names
                .get(&assignment.user_id)
                .cloned()
                .unwrap_or_else(|| assignment.user_id.to_string()),
            role_in_job: assignment.role_in_job.clone(),
            notes: display_optional(assignment.notes.as_deref()),
            assigned: display_time(assignment.assigned_at),
        })
        .collect();
    let job = &details.job;
    Ok(JobDetailTemplate {
        username: session.0.user.username,
        job: JobRow::from(job),
        description: display_optional(job.description.as_deref()),
        started: job.started_at.map_or_else(|| "-".to_string(), display_time),
        completed: job
            .completed_at
            .map_or_else(|| "-".to_string(), display_time),
        closed: job.status.is_terminal(),
        statuses: next_status_options(job.status),
        assignments,
    })
}

/// `POST /admin/jobs/{id}/status` then redirect back to the detail page.
pub async fn update_status<P: Ports>(
    State(state): State<AppState<P>>,
    session: AdminSession,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, PanelError> {
    let id = parse_job_id(&id)?;
    let status = parse_status(&form.status)?
        .ok_or(PmTrackError::from(ValidationError::MissingField("status")))?;
    state.jobs.set_status(&session.actor(), id, status).await?;
    Ok(Redirect::to(&format!("/admin/jobs/{id}")))
}
