//! HTTP error response mapping.

use std::error::Error as _;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use pmtrack_domain::error::{AuthError, PmTrackError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`PmTrackError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(PmTrackError);

impl ApiError {
    /// The wrapped domain error.
    #[must_use]
    pub fn inner(&self) -> &PmTrackError {
        &self.0
    }
}

impl From<PmTrackError> for ApiError {
    fn from(err: PmTrackError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

/// Status code and client-facing message for a domain error.
pub(crate) fn classify(err: &PmTrackError) -> (StatusCode, String) {
    match err {
        PmTrackError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
        PmTrackError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
        PmTrackError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
        PmTrackError::Forbidden(err) => {
            tracing::warn!(reason = %err, "permission denied");
            (StatusCode::FORBIDDEN, err.to_string())
        }
        PmTrackError::Storage(err) => {
            tracing::error!(error = %err, source = ?err.source(), "storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
        PmTrackError::Internal(err) => {
            tracing::error!(error = %err, source = ?err.source(), "internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = classify(&self.0);
        let mut response = (status, Json(ErrorBody { error: message })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmtrack_domain::access::Permission;
    use pmtrack_domain::error::{ForbiddenError, NotFoundError, ValidationError};

    #[test]
    fn should_map_each_error_kind_to_its_status() {
        let cases: Vec<(PmTrackError, StatusCode)> = vec![
            (ValidationError::UsernameTaken.into(), StatusCode::BAD_REQUEST),
            (
                NotFoundError {
                    entity: "Job",
                    id: "x".to_string(),
                }
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (AuthError::ExpiredToken.into(), StatusCode::UNAUTHORIZED),
            (
                ForbiddenError::MissingPermission(Permission::ManageUsers).into(),
                StatusCode::FORBIDDEN,
            ),
            (
                PmTrackError::internal(std::io::Error::other("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn should_challenge_bearer_on_unauthorized() {
        let response = ApiError::from(AuthError::MissingToken).into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn should_hide_internal_details() {
        let (_, message) = classify(&PmTrackError::storage(std::io::Error::other(
            "disk on fire",
        )));
        assert_eq!(message, "internal server error");
    }
}
