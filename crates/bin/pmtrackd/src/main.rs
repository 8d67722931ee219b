//! `pmtrackd` entry point: load configuration, wire adapters, serve.

use pmtrack_adapter_http_axum::RouterConfig;
use pmtrack_adapter_storage_sqlite_sqlx::Config as DbConfig;
use pmtrackd::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DbConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;

    // Services
    let state = pmtrackd::build_state(&db, config.jwt_config())?;
    if let Some(admin) = pmtrackd::bootstrap::ensure_admin(&state, &config.auth).await? {
        tracing::info!(username = %admin.username, "administrator account ready");
    }

    // HTTP
    let app = pmtrack_adapter_http_axum::build(
        state,
        &RouterConfig {
            frontend_dir: config.frontend.dir.clone(),
        },
    );

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "pmtrackd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("pmtrackd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
