//! JSON REST API under `/api/v1`.

#[allow(clippy::missing_errors_doc)]
pub mod admin;
#[allow(clippy::missing_errors_doc)]
pub mod auth;
#[allow(clippy::missing_errors_doc)]
pub mod inspections;
#[allow(clippy::missing_errors_doc)]
pub mod issues;
#[allow(clippy::missing_errors_doc)]
pub mod jobs;
#[allow(clippy::missing_errors_doc)]
pub mod maintenance;
#[allow(clippy::missing_errors_doc)]
pub mod properties;
#[allow(clippy::missing_errors_doc)]
pub mod topics;
#[allow(clippy::missing_errors_doc)]
pub mod users;
#[allow(clippy::missing_errors_doc)]
pub mod work_orders;

use std::str::FromStr;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use serde::Serialize;

use pmtrack_app::ports::Ports;
use pmtrack_domain::error::{PmTrackError, ValidationError};

use crate::error::ApiError;
use crate::state::AppState;

/// `201 Created` with the created record as body.
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// `204 No Content`, returned by deletes.
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// `{"message": ...}` confirmation body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Parse a path or query identifier, reporting `kind` on failure.
pub(crate) fn parse_id<T: FromStr>(kind: &'static str, raw: &str) -> Result<T, ApiError> {
    T::from_str(raw).map_err(|_| {
        ApiError::from(PmTrackError::from(ValidationError::InvalidId {
            kind,
            value: raw.to_string(),
        }))
    })
}

/// Parse an optional query identifier.
pub(crate) fn parse_optional_id<T: FromStr>(
    kind: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ApiError> {
    raw.map(|raw| parse_id(kind, raw)).transpose()
}

/// Build the API sub-router.
pub fn routes<P: Ports>() -> Router<AppState<P>> {
    Router::new()
        .route("/auth/register", post(auth::register::<P>))
        .route("/auth/login", post(auth::login::<P>))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout::<P>))
        .route("/auth/change-password", post(auth::change_password::<P>))
        .route("/auth/verify-token", get(auth::verify_token))
        .route("/users", get(users::list::<P>).post(users::create::<P>))
        .route(
            "/users/{id}",
            get(users::get::<P>)
                .put(users::update::<P>)
                .delete(users::delete::<P>),
        )
        .route(
            "/properties",
            get(properties::list::<P>).post(properties::create::<P>),
        )
        .route(
            "/properties/{id}",
            get(properties::get::<P>)
                .put(properties::update::<P>)
                .delete(properties::delete::<P>),
        )
        .route(
            "/properties/{id}/rooms",
            get(properties::list_rooms::<P>).post(properties::create_room::<P>),
        )
        .route(
            "/properties/{id}/rooms/{room_id}",
            get(properties::get_room::<P>)
                .put(properties::update_room::<P>)
                .delete(properties::delete_room::<P>),
        )
        .route(
            "/properties/{id}/rooms/{room_id}/machines",
            get(properties::list_machines::<P>).post(properties::create_machine::<P>),
        )
        .route(
            "/properties/{id}/rooms/{room_id}/machines/{machine_id}",
            get(properties::get_machine::<P>)
                .put(properties::update_machine::<P>)
                .delete(properties::delete_machine::<P>),
        )
        .route("/topics", get(topics::list::<P>).post(topics::create::<P>))
        .route(
            "/topics/{id}",
            get(topics::get::<P>)
                .put(topics::update::<P>)
                .delete(topics::delete::<P>),
        )
        .route("/jobs", get(jobs::list::<P>).post(jobs::create::<P>))
        .route(
            "/jobs/{id}",
            get(jobs::get::<P>)
                .put(jobs::update::<P>)
                .delete(jobs::delete::<P>),
        )
        .route(
            "/jobs/{id}/assignments",
            get(jobs::list_assignments::<P>).post(jobs::assign::<P>),
        )
        .route("/jobs/{id}/history", get(jobs::history::<P>))
        .route(
            "/jobs/assignments/{assignment_id}",
            put(jobs::update_assignment::<P>).delete(jobs::remove_assignment::<P>),
        )
        .route("/jobs/user/{user_id}/assigned", get(jobs::assigned_to_user::<P>))
        .route(
            "/work-orders",
            get(work_orders::list::<P>).post(work_orders::create::<P>),
        )
        .route("/work-orders/stats/summary", get(work_orders::summary::<P>))
        .route("/work-orders/dashboard/pending", get(work_orders::pending::<P>))
        .route(
            "/work-orders/dashboard/in-progress",
            get(work_orders::in_progress::<P>),
        )
        .route(
            "/work-orders/dashboard/completed",
            get(work_orders::completed::<P>),
        )
        .route(
            "/work-orders/{id}",
            get(work_orders::get::<P>)
                .put(work_orders::update::<P>)
                .delete(work_orders::delete::<P>),
        )
        .route("/work-orders/{id}/assign", put(work_orders::assign::<P>))
        .route("/work-orders/{id}/status", put(work_orders::set_status::<P>))
        .route(
            "/inspections",
            get(inspections::list::<P>).post(inspections::create::<P>),
        )
        .route("/inspections/stats/summary", get(inspections::summary::<P>))
        .route("/inspections/dashboard/failed", get(inspections::failed::<P>))
        .route(
            "/inspections/{id}",
            get(inspections::get::<P>)
                .put(inspections::update::<P>)
                .delete(inspections::delete::<P>),
        )
        .route(
            "/maintenance/topics/{id}/procedures",
            get(maintenance::list_procedures::<P>).post(maintenance::create_procedure::<P>),
        )
        .route(
            "/maintenance/topics/{id}/procedures/{procedure_id}",
            get(maintenance::get_procedure::<P>)
                .put(maintenance::update_procedure::<P>)
                .delete(maintenance::delete_procedure::<P>),
        )
        .route(
            "/maintenance/schedules",
            get(maintenance::list_schedules::<P>).post(maintenance::create_schedule::<P>),
        )
        .route(
            "/maintenance/schedules/{id}",
            get(maintenance::get_schedule::<P>)
                .put(maintenance::update_schedule::<P>)
                .delete(maintenance::delete_schedule::<P>),
        )
        .route(
            "/maintenance/schedules/{id}/executions",
            get(maintenance::list_executions::<P>).post(maintenance::create_execution::<P>),
        )
        .route(
            "/maintenance/executions/{id}",
            get(maintenance::get_execution::<P>)
                .put(maintenance::update_execution::<P>)
                .delete(maintenance::delete_execution::<P>),
        )
        .route("/maintenance/dashboard/overdue", get(maintenance::overdue::<P>))
        .route("/maintenance/dashboard/upcoming", get(maintenance::upcoming::<P>))
        .route("/issues", get(issues::list::<P>).post(issues::create::<P>))
        .route("/issues/stats/summary", get(issues::summary::<P>))
        .route("/issues/dashboard/open-issues", get(issues::open::<P>))
        .route("/issues/dashboard/critical-issues", get(issues::critical::<P>))
        .route(
            "/issues/{id}",
            get(issues::get::<P>)
                .put(issues::update::<P>)
                .delete(issues::delete::<P>),
        )
        .route("/issues/{id}/assign", put(issues::assign::<P>))
        .route("/issues/{id}/status", put(issues::set_status::<P>))
        .route("/admin/stats", get(admin::stats::<P>))
        .route("/admin/users/by-role", get(admin::users_by_role::<P>))
        .route(
            "/admin/users/deactivate-inactive",
            post(admin::deactivate_inactive::<P>),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmtrack_domain::id::JobId;

    #[test]
    fn should_parse_valid_id() {
        let id = JobId::new();
        let parsed: JobId = parse_id("job", &id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_reject_malformed_id_as_validation_error() {
        let err = parse_id::<JobId>("job", "not-a-uuid").unwrap_err();
        assert!(matches!(
            err.inner(),
            PmTrackError::Validation(ValidationError::InvalidId { kind: "job", .. })
        ));
    }

    #[test]
    fn should_pass_through_missing_optional_id() {
        assert!(parse_optional_id::<JobId>("job", None).unwrap().is_none());
    }
}
