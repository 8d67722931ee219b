//! Preventive maintenance endpoints: procedures, schedules and executions.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use pmtrack_app::ports::Ports;
use pmtrack_domain::id::{MachineId, PmExecutionId, PmScheduleId, ProcedureId, TopicId, UserId};
use pmtrack_domain::pm_schedule::{
    FrequencyType, PmExecution, PmExecutionFilter, PmExecutionPatch, PmSchedule,
    PmScheduleFilter, PmSchedulePatch, PmStatus,
};
use pmtrack_domain::procedure::{Procedure, ProcedurePatch};
use pmtrack_domain::time::{Timestamp, now};

use super::properties::ActiveQuery;
use super::{Created, NoContent, parse_id, parse_optional_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProcedureRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSchedulesQuery {
    pub machine_id: Option<String>,
    pub procedure_id: Option<String>,
    pub user_id: Option<String>,
    pub frequency: Option<FrequencyType>,
    pub is_active: Option<bool>,
    /// Only schedules whose due date has passed.
    #[serde(default)]
    pub overdue: bool,
}

impl ListSchedulesQuery {
    fn filter(&self) -> Result<PmScheduleFilter, ApiError> {
        Ok(PmScheduleFilter {
            machine_id: parse_optional_id("machine", self.machine_id.as_deref())?,
            procedure_id: parse_optional_id("procedure", self.procedure_id.as_deref())?,
            user_id: parse_optional_id("user", self.user_id.as_deref())?,
            frequency: self.frequency,
            is_active: self.is_active,
            due_before: self.overdue.then(now),
            ..PmScheduleFilter::default()
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub machine_id: MachineId,
    pub procedure_id: ProcedureId,
    pub user_id: UserId,
    pub frequency: FrequencyType,
    #[serde(default)]
    pub frequency_value: Option<i64>,
    #[serde(default)]
    pub last_completed: Option<Timestamp>,
    /// Defaults to one recurrence after `last_completed`, or after now.
    #[serde(default)]
    pub next_due: Option<Timestamp>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListExecutionsQuery {
    pub status: Option<PmStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExecutionRequest {
    #[serde(default)]
    pub status: PmStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    #[serde(default = "default_days_ahead")]
    pub days: i64,
}

const fn default_days_ahead() -> i64 {
    7
}

#[derive(Debug, Serialize)]
pub struct OverdueDashboard {
    pub overdue_count: usize,
    pub overdue_schedules: Vec<PmSchedule>,
}

#[derive(Debug, Serialize)]
pub struct UpcomingDashboard {
    pub upcoming_count: usize,
    pub upcoming_schedules: Vec<PmSchedule>,
    pub days_ahead: i64,
}

fn topic_id(raw: &str) -> Result<TopicId, ApiError> {
    parse_id("topic", raw)
}

fn procedure_id(raw: &str) -> Result<ProcedureId, ApiError> {
    parse_id("procedure", raw)
}

fn schedule_id(raw: &str) -> Result<PmScheduleId, ApiError> {
    parse_id("pm schedule", raw)
}

fn execution_id(raw: &str) -> Result<PmExecutionId, ApiError> {
    parse_id("pm execution", raw)
}

/// `GET /api/v1/maintenance/topics/{id}/procedures`
pub async fn list_procedures<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<Vec<Procedure>>, ApiError> {
    let procedures = state
        .maintenance
        .list_procedures(&user.actor(), topic_id(&id)?, query.is_active)
        .await?;
    Ok(Json(procedures))
}

/// `POST /api/v1/maintenance/topics/{id}/procedures`
pub async fn create_procedure<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CreateProcedureRequest>,
) -> Result<Created<Procedure>, ApiError> {
    let procedure = Procedure::builder()
        .topic_id(topic_id(&id)?)
        .title(req.title)
        .description(req.description)
        .instructions(req.instructions)
        .estimated_minutes(req.estimated_minutes)
        .build()?;
    Ok(Created(
        state
            .maintenance
            .create_procedure(&user.actor(), procedure)
            .await?,
    ))
}

/// `GET /api/v1/maintenance/topics/{id}/procedures/{procedure_id}`
pub async fn get_procedure<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, procedure)): Path<(String, String)>,
) -> Result<Json<Procedure>, ApiError> {
    let procedure = state
        .maintenance
        .get_procedure(&user.actor(), topic_id(&id)?, procedure_id(&procedure)?)
        .await?;
    Ok(Json(procedure))
}

/// `PUT /api/v1/maintenance/topics/{id}/procedures/{procedure_id}`
pub async fn update_procedure<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, procedure)): Path<(String, String)>,
    Json(patch): Json<ProcedurePatch>,
) -> Result<Json<Procedure>, ApiError> {
    let procedure = state
        .maintenance
        .update_procedure(
            &user.actor(),
            topic_id(&id)?,
            procedure_id(&procedure)?,
            patch,
        )
        .await?;
    Ok(Json(procedure))
}

/// `DELETE /api/v1/maintenance/topics/{id}/procedures/{procedure_id}`
pub async fn delete_procedure<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, procedure)): Path<(String, String)>,
) -> Result<NoContent, ApiError> {
    state
        .maintenance
        .delete_procedure(&user.actor(), topic_id(&id)?, procedure_id(&procedure)?)
        .await?;
    Ok(NoContent)
}

/// `GET /api/v1/maintenance/schedules`
pub async fn list_schedules<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<ListSchedulesQuery>,
) -> Result<Json<Vec<PmSchedule>>, ApiError> {
    let schedules = state
        .maintenance
        .list_schedules(&user.actor(), &query.filter()?)
        .await?;
    Ok(Json(schedules))
}

/// `POST /api/v1/maintenance/schedules`
pub async fn create_schedule<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<Created<PmSchedule>, ApiError> {
    let mut builder = PmSchedule::builder()
        .machine_id(req.machine_id)
        .procedure_id(req.procedure_id)
        .user_id(req.user_id)
        .frequency(req.frequency)
        .last_completed(req.last_completed)
        .next_due(req.next_due);
    if let Some(value) = req.frequency_value {
        builder = builder.frequency_value(value);
    }
    let schedule = builder.build()?;
    Ok(Created(
        state
            .maintenance
            .create_schedule(&user.actor(), schedule)
            .await?,
    ))
}

/// `GET /api/v1/maintenance/schedules/{id}`
pub async fn get_schedule<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PmSchedule>, ApiError> {
    let schedule = state
        .maintenance
        .get_schedule(&user.actor(), schedule_id(&id)?)
        .await?;
    Ok(Json(schedule))
}

/// `PUT /api/v1/maintenance/schedules/{id}`
pub async fn update_schedule<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<PmSchedulePatch>,
) -> Result<Json<PmSchedule>, ApiError> {
    let schedule = state
        .maintenance
        .update_schedule(&user.actor(), schedule_id(&id)?, patch)
        .await?;
    Ok(Json(schedule))
}

/// `DELETE /api/v1/maintenance/schedules/{id}`
pub async fn delete_schedule<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    state
        .maintenance
        .delete_schedule(&user.actor(), schedule_id(&id)?)
        .await?;
    Ok(NoContent)
}

/// `GET /api/v1/maintenance/schedules/{id}/executions`
pub async fn list_executions<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<ListExecutionsQuery>,
) -> Result<Json<Vec<PmExecution>>, ApiError> {
    let filter = PmExecutionFilter {
        pm_schedule_id: Some(schedule_id(&id)?),
        status: query.status,
        ..PmExecutionFilter::default()
    };
    let executions = state
        .maintenance
        .list_executions(&user.actor(), &filter)
        .await?;
    Ok(Json(executions))
}

/// `POST /api/v1/maintenance/schedules/{id}/executions`
///
/// The caller is recorded as the executor.
pub async fn create_execution<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CreateExecutionRequest>,
) -> Result<Created<PmExecution>, ApiError> {
    let actor = user.actor();
    let execution = PmExecution::new(schedule_id(&id)?, actor.user_id, req.status, req.notes);
    Ok(Created(
        state
            .maintenance
            .create_execution(&actor, execution)
            .await?,
    ))
}

/// `GET /api/v1/maintenance/executions/{id}`
pub async fn get_execution<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PmExecution>, ApiError> {
    let execution = state
        .maintenance
        .get_execution(&user.actor(), execution_id(&id)?)
        .await?;
    Ok(Json(execution))
}

/// `PUT /api/v1/maintenance/executions/{id}`
pub async fn update_execution<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<PmExecutionPatch>,
) -> Result<Json<PmExecution>, ApiError> {
    let execution = state
        .maintenance
        .update_execution(&user.actor(), execution_id(&id)?, patch)
        .await?;
    Ok(Json(execution))
}

/// `DELETE /api/v1/maintenance/executions/{id}`
pub async fn delete_execution<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    state
        .maintenance
        .delete_execution(&user.actor(), execution_id(&id)?)
        .await?;
    Ok(NoContent)
}

/// `GET /api/v1/maintenance/dashboard/overdue`
pub async fn overdue<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<OverdueDashboard>, ApiError> {
    let schedules = state.maintenance.overdue(&user.actor()).await?;
    Ok(Json(OverdueDashboard {
        overdue_count: schedules.len(),
        overdue_schedules: schedules,
    }))
}

/// `GET /api/v1/maintenance/dashboard/upcoming?days=7`
pub async fn upcoming<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<UpcomingDashboard>, ApiError> {
    let schedules = state
        .maintenance
        .upcoming(&user.actor(), query.days)
        .await?;
    Ok(Json(UpcomingDashboard {
        upcoming_count: schedules.len(),
        upcoming_schedules: schedules,
        days_ahead: query.days,
    }))
}
