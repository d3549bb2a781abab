use booknest_core::error::AppError;
use booknest_core::observability::{init_metrics, init_tracing, shutdown_tracing};
use booknest_web::{
    build_router,
    config::WebConfig,
    db,
    services::{Database, GoTrueClient},
    AppState,
};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = WebConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;
    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting bookmarking service"
    );

    let pool = db::create_pool(&config.database).await?;
    if config.database.run_migrations {
        db::run_migrations(&pool).await?;
    }
    let database = Arc::new(Database::new(pool));

    let identity = Arc::new(GoTrueClient::new(&config.identity)?);

    let state = AppState::new(config.clone(), identity, database.clone(), database);
    let app = build_router(state)?;

    let addr = config.common.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    shutdown_tracing();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
