//! Admin panel overview: system-wide counters.

use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};

use pmtrack_app::ports::Ports;
use pmtrack_app::stats::SystemStats;

use super::PanelError;
use crate::api::admin::system_stats;
use crate::auth::AdminSession;
use crate::state::AppState;

/// A label and its count.
pub struct Counter {
    pub label: &'static str,
    pub count: u64,
}

/// Overview page template.
#[derive(Template)]
#[template(path = "overview.html")]
pub struct OverviewTemplate {
    username: String,
    users_total: u64,
    users_active: u64,
    users_by_role: Vec<Counter>,
    properties: u64,
    rooms: u64,
    machines: u64,
    active_machines: u64,
    jobs_total: u64,
    jobs_by_status: Vec<Counter>,
    work_orders_total: u64,
    work_orders_pending: u64,
    work_orders_in_progress: u64,
    completion_rate: String,
    inspections_total: u64,
    inspections_failed: u64,
    pm_schedules: u64,
    pm_overdue: u64,
    pm_completed: u64,
    issues_open: u64,
    issues_critical: u64,
}

impl OverviewTemplate {
    fn new(username: String, stats: &SystemStats) -> Self {
        Self {
            username,
            users_total: stats.users.total,
            users_active: stats.users.active,
            users_by_role: stats
                .users
                .by_role
                .iter()
                .map(|(role, count)| Counter {
                    label: role.as_str(),
                    count: *count,
                })
                .collect(),
            properties: stats.facilities.properties,
            rooms: stats.facilities.rooms,
            machines: stats.facilities.machines,
            active_machines: stats.facilities.active_machines,
            jobs_total: stats.total_jobs(),
            jobs_by_status: stats
                .jobs_by_status
                .iter()
                .map(|(status, count)| Counter {
                    label: status.as_str(),
                    count: *count,
                })
                .collect(),
            work_orders_total: stats.work_orders.total_work_orders,
            work_orders_pending: stats.work_orders.pending_work_orders,
            work_orders_in_progress: stats.work_orders.in_progress_work_orders,
            completion_rate: format!("{:.1}%", stats.work_orders.completion_rate),
            inspections_total: stats.inspections.total_inspections,
            inspections_failed: stats.inspections.failed_inspections,
            pm_schedules: stats.maintenance.total_schedules,
            pm_overdue: stats.maintenance.overdue_schedules,
            pm_completed: stats.maintenance.completed_executions,
            issues_open: stats.issues.open_issues,
            issues_critical: stats.issues.critical_issues,
        }
    }
}

impl IntoResponse for OverviewTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// `GET /admin`
pub async fn index<P: Ports>(
    State(state): State<AppState<P>>,
    session: AdminSession,
) -> Result<OverviewTemplate, PanelError> {
    let stats = system_stats(&state, &session.actor()).await?;
    Ok(OverviewTemplate::new(session.0.user.username, &stats))
}
