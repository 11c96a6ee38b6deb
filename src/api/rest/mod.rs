pub mod deliveries;
pub mod delivery_images;
pub mod form;
pub mod location_tracking;
pub mod multi_item_orders;
pub mod riders;
pub mod users;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::rest::form::UploadedFile;
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::PUBLIC_PREFIX;

pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(state.images.root());
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .merge(users::router())
        .merge(riders::router())
        .merge(deliveries::router())
        .merge(delivery_images::router())
        .merge(location_tracking::router())
        .merge(multi_item_orders::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest_service(&format!("/{PUBLIC_PREFIX}"), uploads)
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    message: &'static str,
    database: &'static str,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                message: "ok",
                database: "ok",
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    message: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

pub(crate) fn parse_id(raw: &str, name: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("Invalid {name}. It must be a number.")))
}

/// Stores the uploaded file, if any, before its owning record is written.
pub(crate) async fn store_upload(
    state: &AppState,
    file: Option<UploadedFile>,
) -> Result<Option<String>, AppError> {
    let Some(file) = file else {
        return Ok(None);
    };

    let path = state.images.store(&file.bytes, &file.file_name).await?;
    state.metrics.images_stored_total.inc();
    Ok(Some(path))
}

/// Passes `result` through, deleting the just-stored image when the record write failed.
pub(crate) async fn release_on_failure<T, E>(
    state: &AppState,
    image: Option<&str>,
    result: Result<T, E>,
) -> Result<T, AppError>
where
    E: Into<AppError>,
{
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Some(path) = image {
                state.images.discard(path).await;
            }
            Err(err.into())
        }
    }
}
