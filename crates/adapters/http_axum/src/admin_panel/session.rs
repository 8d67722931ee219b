//! Admin panel sign-in and sign-out.

use askama::Template;
use axum::Form;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use pmtrack_app::ports::Ports;
use pmtrack_domain::time::{Timestamp, now};

use crate::auth::{ADMIN_PANEL_PERMISSION, SESSION_COOKIE, session_cookie};
use crate::error::classify;
use crate::state::AppState;

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    error: Option<String>,
    username: String,
}

impl LoginTemplate {
    fn failed(status: StatusCode, username: String, error: String) -> Response {
        let page = Self {
            error: Some(error),
            username,
        };
        (status, Html(page.to_string())).into_response()
    }
}

impl IntoResponse for LoginTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn session_cookie_header(token: &str, expires_at: Timestamp) -> Option<HeaderValue> {
    let max_age = (expires_at - now()).num_seconds().max(0);
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/admin; SameSite=Strict; Max-Age={max_age}"
    ))
    .ok()
}

fn cleared_cookie_header() -> HeaderValue {
    HeaderValue::from_static("pmtrack_session=; HttpOnly; Path=/admin; SameSite=Strict; Max-Age=0")
}

/// `GET /admin/login`
pub async fn login_page() -> LoginTemplate {
    LoginTemplate {
        error: None,
        username: String::new(),
    }
}

/// `POST /admin/login` sets the session cookie and redirects to the overview.
pub async fn login<P: Ports>(
    State(state): State<AppState<P>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let login = match state.auth.login(&form.username, &form.password).await {
        Ok(login) => login,
        Err(err) => {
            let (status, message) = classify(&err);
            return LoginTemplate::failed(status, form.username, message);
        }
    };
    if !login.user.role.grants(ADMIN_PANEL_PERMISSION) {
        tracing::warn!(user_id = %login.user.id, "admin panel login denied");
        return LoginTemplate::failed(
            StatusCode::FORBIDDEN,
            form.username,
            "the admin panel requires a manager account".to_string(),
        );
    }
    let Some(cookie) = session_cookie_header(&login.token.token, login.token.expires_at) else {
        tracing::error!("issued token is not a valid cookie value");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    ([(SET_COOKIE, cookie)], Redirect::to("/admin")).into_response()
}

/// `POST /admin/logout` revokes the session token and clears the cookie.
pub async fn logout<P: Ports>(State(state): State<AppState<P>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_cookie(&headers)
        && let Ok(session) = state.auth.authenticate(token).await
        && let Err(err) = state.auth.logout(&session).await
    {
        tracing::warn!(error = %err, "failed to revoke admin session");
    }
    (
        [(SET_COOKIE, cleared_cookie_header())],
        Redirect::to("/admin/login"),
    )
        .into_response()
}
