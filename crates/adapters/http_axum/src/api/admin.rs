//! System statistics for administrators.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use pmtrack_app::ports::Ports;
use pmtrack_app::stats::{FacilityStats, SystemStats};
use pmtrack_domain::access::Actor;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::inspection::InspectionSummary;
use pmtrack_domain::issue::IssueSummary;
use pmtrack_domain::work_order::WorkOrderSummary;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Gather the dashboard counters from every service.
pub(crate) async fn system_stats<P: Ports>(
    state: &AppState<P>,
    actor: &Actor,
) -> Result<SystemStats, PmTrackError> {
    let users = state.users.stats(actor).await?;
    let inventory = state.facilities.inventory(actor).await?;
    let jobs_by_status = state.jobs.status_counts(actor).await?;
    let work_orders = state.work_orders.summary(actor).await?;
    let inspections = state.inspections.summary(actor).await?;
    let maintenance = state.maintenance.summary(actor).await?;
    let issues = state.issues.summary(actor).await?;
    Ok(SystemStats {
        users,
        facilities: FacilityStats::from(&inventory),
        jobs_by_status,
        work_orders,
        inspections,
        maintenance,
        issues,
    })
}

#[derive(Debug, Serialize)]
pub struct UserCounts {
    pub total: u64,
    pub active: u64,
    pub by_role: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Serialize)]
pub struct JobCounts {
    pub total: u64,
    pub by_status: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleCounts {
    pub total: u64,
    pub overdue: u64,
}

/// Body of `GET /api/v1/admin/stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub users: UserCounts,
    pub properties: u64,
    pub active_properties: u64,
    pub rooms: u64,
    pub machines: u64,
    pub active_machines: u64,
    pub jobs: JobCounts,
    pub work_orders: WorkOrderSummary,
    pub inspections: InspectionSummary,
    pub pm_schedules: ScheduleCounts,
    pub total_pm_executions: u64,
    pub completed_pm_executions: u64,
    pub issues: IssueSummary,
}

impl From<SystemStats> for StatsResponse {
    fn from(stats: SystemStats) -> Self {
        let jobs = JobCounts {
            total: stats.total_jobs(),
            by_status: stats
                .jobs_by_status
                .iter()
                .map(|(status, count)| (status.as_str(), *count))
                .collect(),
        };
        Self {
            users: UserCounts {
                total: stats.users.total,
                active: stats.users.active,
                by_role: stats
                    .users
                    .by_role
                    .iter()
                    .map(|(role, count)| (role.as_str(), *count))
                    .collect(),
            },
            properties: stats.facilities.properties,
            active_properties: stats.facilities.active_properties,
            rooms: stats.facilities.rooms,
            machines: stats.facilities.machines,
            active_machines: stats.facilities.active_machines,
            jobs,
            work_orders: stats.work_orders,
            inspections: stats.inspections,
            pm_schedules: ScheduleCounts {
                total: stats.maintenance.total_schedules,
                overdue: stats.maintenance.overdue_schedules,
            },
            total_pm_executions: stats.maintenance.total_executions,
            completed_pm_executions: stats.maintenance.completed_executions,
            issues: stats.issues,
        }
    }
}

/// `GET /api/v1/admin/stats`
pub async fn stats<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = system_stats(&state, &user.actor()).await?;
    Ok(Json(stats.into()))
}

/// `GET /api/v1/admin/users/by-role`: `{"TECHNICIAN": 3, ...}`.
pub async fn users_by_role<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<BTreeMap<&'static str, u64>>, ApiError> {
    let counts = state.users.users_by_role(&user.actor()).await?;
    Ok(Json(
        counts
            .into_iter()
            .map(|(role, count)| (role.as_str(), count))
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeactivateInactiveQuery {
    #[serde(default = "default_days_inactive")]
    pub days_inactive: i64,
}

const fn default_days_inactive() -> i64 {
    365
}

#[derive(Debug, Serialize)]
pub struct DeactivateInactiveResponse {
    pub message: String,
    pub users_deactivated: u64,
    pub days_inactive: i64,
}

/// `POST /api/v1/admin/users/deactivate-inactive?days_inactive=365`
pub async fn deactivate_inactive<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<DeactivateInactiveQuery>,
) -> Result<Json<DeactivateInactiveResponse>, ApiError> {
    let count = state
        .users
        .deactivate_inactive(&user.actor(), query.days_inactive)
        .await?;
    Ok(Json(DeactivateInactiveResponse {
        message: format!("Deactivated {count} inactive users"),
        users_deactivated: count,
        days_inactive: query.days_inactive,
    }))
}
