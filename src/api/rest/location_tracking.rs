use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::rest::parse_id;
use crate::db::{location_tracking, DbError};
use crate::error::AppError;
use crate::geo::PointInput;
use crate::models::location::LocationRecord;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/location_tracking", post(track_location).get(list_locations))
        .route("/location_tracking/rider-location/:rider_id", get(rider_location))
}

#[derive(Deserialize)]
pub struct TrackLocationRequest {
    pub delivery_id: Option<i64>,
    pub rider_id: Option<i64>,
    pub rider_location: Option<PointInput>,
}

async fn track_location(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TrackLocationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(payload) = payload?;
    let (Some(delivery_id), Some(rider_id), Some(location)) =
        (payload.delivery_id, payload.rider_id, payload.rider_location)
    else {
        return Err(AppError::Validation(
            "delivery_id, rider_id, and rider_location are required".to_string(),
        ));
    };
    let point = location
        .into_point()
        .map_err(|err| AppError::Validation(format!("rider_location: {err}")))?;

    let track_id = location_tracking::record(state.db.pool(), delivery_id, rider_id, &point).await?;

    state.metrics.location_pings_total.inc();
    debug!(track_id, delivery_id, rider_id, "rider location tracked");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Rider location tracked", "track_id": track_id })),
    ))
}

async fn rider_location(
    State(state): State<Arc<AppState>>,
    Path(rider_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let rider_id = parse_id(&rider_id, "rider_id")?;

    let latest = match location_tracking::latest_for_rider(state.db.pool(), rider_id).await {
        Ok(record) => record,
        Err(DbError::NotFound { .. }) => {
            return Err(AppError::NotFound("No location found for this rider".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Json(json!({
        "message": "Rider location found",
        "rider_location": latest.rider_location,
        "timestamp": latest.timestamp,
    })))
}

async fn list_locations(State(state): State<Arc<AppState>>) -> Result<Json<Vec<LocationRecord>>, AppError> {
    Ok(Json(location_tracking::list_all(state.db.pool()).await?))
}
