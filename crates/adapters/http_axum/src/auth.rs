//! Request extractors resolving the caller's session.
//!
//! The API reads `Authorization: Bearer <token>`; the admin panel reads the
//! same token from the [`SESSION_COOKIE`] cookie.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::response::Redirect;

use pmtrack_app::ports::Ports;
use pmtrack_app::services::auth_service::Session;
use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::AuthError;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the admin panel session cookie.
pub const SESSION_COOKIE: &str = "pmtrack_session";

/// Permission required to use the admin panel.
pub const ADMIN_PANEL_PERMISSION: Permission = Permission::ViewStatistics;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub(crate) fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

/// The authenticated caller of an API endpoint.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

impl CurrentUser {
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

impl<P: Ports> FromRequestParts<AppState<P>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let session = state.auth.authenticate(token).await?;
        Ok(Self(session))
    }
}

/// A caller that may or may not present a token. A token that is present
/// must still be valid.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Session>);

impl<P: Ports> FromRequestParts<AppState<P>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Some(token) => Ok(Self(Some(state.auth.authenticate(token).await?))),
            None => Ok(Self(None)),
        }
    }
}

/// An admin panel session. Missing, invalid or under-privileged sessions
/// are redirected to the login page.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl AdminSession {
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

impl<P: Ports> FromRequestParts<AppState<P>> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P>,
    ) -> Result<Self, Self::Rejection> {
        let to_login = || Redirect::to("/admin/login");
        let token = session_cookie(&parts.headers).ok_or_else(to_login)?;
        let session = match state.auth.authenticate(token).await {
            Ok(session) => session,
            Err(err) => {
                tracing::debug!(error = %err, "admin session rejected");
                return Err(to_login());
            }
        };
        if !session.actor().can(ADMIN_PANEL_PERMISSION) {
            tracing::warn!(user_id = %session.user.id, "admin panel access denied");
            return Err(to_login());
        }
        Ok(Self(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: axum::http::HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn should_read_bearer_token_case_insensitively() {
        assert_eq!(
            bearer_token(&headers(AUTHORIZATION, "Bearer abc.def")),
            Some("abc.def")
        );
        assert_eq!(
            bearer_token(&headers(AUTHORIZATION, "bearer abc")),
            Some("abc")
        );
    }

    #[test]
    fn should_ignore_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&headers(AUTHORIZATION, "Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&headers(AUTHORIZATION, "Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn should_find_session_cookie_among_others() {
        assert_eq!(
            session_cookie(&headers(COOKIE, "theme=dark; pmtrack_session=tok; lang=en")),
            Some("tok")
        );
        assert_eq!(session_cookie(&headers(COOKIE, "pmtrack_session=")), None);
        assert_eq!(session_cookie(&headers(COOKIE, "other=1")), None);
    }
}
