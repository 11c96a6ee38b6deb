use std::sync::Arc;

use parcel_dispatch::api;
use parcel_dispatch::config::{Config, LogFormat};
use parcel_dispatch::db::Database;
use parcel_dispatch::error::AppError;
use parcel_dispatch::state::AppState;
use parcel_dispatch::storage::ImageStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let db = Database::connect_with_pool_size(&config.database_url, config.db_pool_size)
        .await
        .map_err(|err| AppError::Internal(format!("failed to open database: {err}")))?;
    db.migrate()
        .await
        .map_err(|err| AppError::Internal(format!("failed to migrate database: {err}")))?;

    let images = ImageStore::open(&config.upload_dir)
        .await
        .map_err(|err| AppError::Internal(format!("failed to open image store: {err}")))?;

    let shared_state = Arc::new(AppState::new(db.clone(), images, config.max_upload_bytes));
    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    db.close().await;
    tracing::info!("http server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
