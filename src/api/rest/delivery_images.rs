use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde_json::{json, Value};

use crate::api::rest::form::FormData;
use crate::api::rest::{parse_id, release_on_failure, store_upload};
use crate::db::delivery_images;
use crate::error::AppError;
use crate::models::delivery_image::DeliveryImage;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/delivery_images", post(create_image).get(list_images))
        .route("/delivery_images/:image_id", get(get_image))
        .route("/delivery_images/update-status/:image_id", put(update_image_status))
        .route(
            "/delivery_images/receiver_phone/:receiver_phone_number",
            get(list_by_receiver_phone),
        )
}

async fn create_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut form = FormData::read(multipart, "image_url").await?;

    let (Ok(delivery_id), Ok(status), true) = (
        form.required_int("delivery_id"),
        form.required("status"),
        form.has_file(),
    ) else {
        return Err(AppError::Validation(
            "delivery_id, status, and image are required".to_string(),
        ));
    };

    let image_url = store_upload(&state, form.take_file()).await?.unwrap_or_default();
    let result = delivery_images::create(state.db.pool(), delivery_id, &image_url, &status).await;
    let image_id = release_on_failure(&state, Some(image_url.as_str()), result).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Image added successfully", "image_id": image_id })),
    ))
}

async fn update_image_status(
    State(state): State<Arc<AppState>>,
    Path(image_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let image_id = parse_id(&image_id, "image_id")?;
    let mut form = FormData::read(multipart, "image_url").await?;
    let status = form
        .text("status")
        .ok_or_else(|| AppError::Validation("Status is required".to_string()))?;

    let image_url = store_upload(&state, form.take_file()).await?;
    let result =
        delivery_images::update(state.db.pool(), image_id, &status, image_url.as_deref()).await;
    release_on_failure(&state, image_url.as_deref(), result).await?;

    Ok(Json(json!({ "message": "Status updated successfully" })))
}

async fn list_images(State(state): State<Arc<AppState>>) -> Result<Json<Vec<DeliveryImage>>, AppError> {
    Ok(Json(delivery_images::list_all(state.db.pool()).await?))
}

async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(image_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let image_id = parse_id(&image_id, "image_id")?;
    let image = delivery_images::get(state.db.pool(), image_id).await?;

    Ok(Json(json!({ "message": "Image found", "image": image })))
}

async fn list_by_receiver_phone(
    State(state): State<Arc<AppState>>,
    Path(receiver_phone_number): Path<String>,
) -> Result<Response, AppError> {
    let images =
        delivery_images::list_by_receiver_phone(state.db.pool(), &receiver_phone_number).await?;

    if images.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "message": "No images found for the provided receiver_phone_number"
            })),
        )
            .into_response());
    }

    Ok(Json(images).into_response())
}
