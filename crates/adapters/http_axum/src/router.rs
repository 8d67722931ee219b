//! Axum router assembly.

use std::path::PathBuf;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use pmtrack_app::ports::Ports;

use crate::state::AppState;

/// Options for [`build`] that do not live in the application state.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    /// Directory of a static frontend served for every unmatched path.
    pub frontend_dir: Option<PathBuf>,
}

/// Build the top-level axum [`Router`].
///
/// Nests the JSON API under `/api/v1` (with permissive CORS) and the admin
/// panel under `/admin`. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level.
pub fn build<P: Ports>(state: AppState<P>, config: &RouterConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            crate::api::routes::<P>().layer(CorsLayer::permissive()),
        )
        .nest("/admin", crate::admin_panel::routes::<P>());
    if let Some(dir) = &config.frontend_dir {
        tracing::info!(dir = %dir.display(), "serving static frontend");
        router = router.fallback_service(ServeDir::new(dir));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
