use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde_json::{json, Value};

use crate::api::rest::form::FormData;
use crate::api::rest::users::LoginRequest;
use crate::api::rest::{parse_id, release_on_failure, store_upload};
use crate::db::riders;
use crate::error::AppError;
use crate::models::rider::{NewRider, Rider, RiderChanges};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/riders", post(create_rider).get(list_riders))
        .route("/riders/login", post(login))
        .route("/riders/:rider_id", get(get_rider).put(update_rider))
}

async fn create_rider(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut form = FormData::read(multipart, "rider_image").await?;

    let mut rider = NewRider {
        phone_number: form.required("phone_number")?,
        password: form.required("password")?,
        name: form.required("name")?,
        rider_image: None,
        vehicle_registration: form.text("vehicle_registration"),
        current_location: form.point("current_location")?,
        availability_status: form.text("availability_status"),
    };

    rider.rider_image = store_upload(&state, form.take_file()).await?;
    let result = riders::create(state.db.pool(), &rider).await;
    let rider_id = release_on_failure(&state, rider.rider_image.as_deref(), result).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Rider created", "rider_id": rider_id })),
    ))
}

async fn update_rider(
    State(state): State<Arc<AppState>>,
    Path(rider_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let rider_id = parse_id(&rider_id, "rider_id")?;
    let mut form = FormData::read(multipart, "rider_image").await?;
    if form.is_empty() {
        return Err(AppError::Validation("no fields to update".to_string()));
    }

    let mut changes = RiderChanges {
        phone_number: form.text("phone_number"),
        password: form.text("password"),
        name: form.text("name"),
        rider_image: None,
        vehicle_registration: form.text("vehicle_registration"),
        current_location: form.point("current_location")?,
        availability_status: form.text("availability_status"),
    };

    changes.rider_image = store_upload(&state, form.take_file()).await?;
    let result = riders::update(state.db.pool(), rider_id, &changes).await;
    release_on_failure(&state, changes.rider_image.as_deref(), result).await?;

    Ok(Json(json!({ "message": "Rider updated successfully" })))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let (phone_number, password) = payload.into_parts()?;

    let rider = riders::find_by_credential(state.db.pool(), &phone_number, &password).await?;

    Ok(Json(json!({ "message": "Login successful", "rider": rider })))
}

async fn get_rider(
    State(state): State<Arc<AppState>>,
    Path(rider_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let rider_id = parse_id(&rider_id, "rider_id")?;
    let rider = riders::get(state.db.pool(), rider_id).await?;

    Ok(Json(json!({ "message": "Rider found", "rider": rider })))
}

async fn list_riders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Rider>>, AppError> {
    Ok(Json(riders::list_all(state.db.pool()).await?))
}
