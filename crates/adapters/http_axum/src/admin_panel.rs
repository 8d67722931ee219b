//! Server-rendered admin panel (no JavaScript).
//!
//! Pages require a session cookie held by a manager or administrator;
//! forms follow Post/Redirect/Get.

#[allow(clippy::missing_errors_doc)]
pub mod jobs;
#[allow(clippy::missing_errors_doc)]
pub mod overview;
#[allow(clippy::missing_errors_doc)]
pub mod records;
#[allow(clippy::missing_errors_doc)]
pub mod session;

use askama::Template;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};

use pmtrack_app::ports::Ports;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::time::Timestamp;

use crate::error::classify;
use crate::state::AppState;

/// Build the admin panel sub-router.
pub fn routes<P: Ports>() -> Router<AppState<P>> {
    Router::new()
        .route("/", get(overview::index::<P>))
        .route(
            "/login",
            get(session::login_page).post(session::login::<P>),
        )
        .route("/logout", post(session::logout::<P>))
        .route("/users", get(records::users::<P>))
        .route("/properties", get(records::properties::<P>))
        .route("/work-orders", get(records::work_orders::<P>))
        .route("/jobs", get(jobs::list::<P>))
        .route("/jobs/{id}", get(jobs::detail::<P>))
        .route("/jobs/{id}/status", post(jobs::update_status::<P>))
}

/// Date and minute, as shown in tables.
pub(crate) fn display_time(at: Timestamp) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn display_optional(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    status: u16,
    message: String,
}

/// A failed admin panel request, rendered as an HTML error page.
#[derive(Debug)]
pub struct PanelError(PmTrackError);

impl From<PmTrackError> for PanelError {
    fn from(err: PmTrackError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        let (status, message) = classify(&self.0);
        let page = ErrorTemplate {
            status: status.as_u16(),
            message,
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "failed to render error page");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmtrack_domain::error::NotFoundError;

    #[test]
    fn should_render_not_found_page_with_status() {
        let response = PanelError::from(PmTrackError::from(NotFoundError {
            entity: "Job",
            id: "42".to_string(),
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn should_show_placeholder_for_missing_values() {
        assert_eq!(display_optional(None), "-");
        assert_eq!(display_optional(Some("B-12")), "B-12");
    }
}
