use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::rest::form::FormData;
use crate::api::rest::{parse_id, release_on_failure, store_upload};
use crate::engine::lifecycle::{self, DeliveryUpdate};
use crate::error::AppError;
use crate::models::delivery::{Delivery, DeliveryStatus, NewDelivery, Stop};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries", post(create_delivery).get(list_deliveries))
        .route("/deliveries/pending-deliveries", get(list_pending))
        .route("/deliveries/update-delivery", put(update_delivery))
        .route(
            "/deliveries/receiver_phone/:receiver_phone_number",
            get(list_by_receiver_phone),
        )
        .route("/deliveries/:sender_id", get(list_by_sender))
}

#[derive(Deserialize)]
pub struct UpdateDeliveryRequest {
    pub delivery_id: Option<i64>,
    pub rider_id: Option<i64>,
    pub delivery_status: Option<String>,
}

async fn create_delivery(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut form = FormData::read(multipart, "product_image").await?;

    if let Some(raw) = form.text("delivery_status") {
        let status: DeliveryStatus = raw.parse().map_err(AppError::Validation)?;
        if status != DeliveryStatus::AwaitingRider {
            return Err(AppError::Validation(format!(
                "new deliveries start as {}, got {status}",
                DeliveryStatus::AwaitingRider
            )));
        }
    }
    if form.text("rider_id").is_some() {
        return Err(AppError::Validation(
            "rider_id is set by a rider claiming the delivery".to_string(),
        ));
    }

    let mut delivery = NewDelivery {
        sender_id: form.required_int("sender_id")?,
        receiver_phone_number: form.required("receiver_phone_number")?,
        pickup: Stop {
            address: form.required("pickup_address")?,
            point: form.required_point("pickup_gps")?,
        },
        dropoff: Stop {
            address: form.required("dropoff_address")?,
            point: form.required_point("dropoff_gps")?,
        },
        product_image: None,
    };

    delivery.product_image = store_upload(&state, form.take_file()).await?;
    let result = lifecycle::create_delivery(&state, &delivery).await;
    let delivery_id = release_on_failure(&state, delivery.product_image.as_deref(), result).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Delivery created", "delivery_id": delivery_id })),
    ))
}

/// Lists that must not be empty answer 404 with a message instead of `[]`.
fn non_empty(items: Vec<Delivery>, empty_message: &str) -> Response {
    if items.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": empty_message })),
        )
            .into_response();
    }
    Json(items).into_response()
}

async fn list_pending(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let pending = lifecycle::list_pending(&state).await?;
    Ok(non_empty(pending, "No pending deliveries found"))
}

async fn update_delivery(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateDeliveryRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let update = DeliveryUpdate::from_parts(
        payload.delivery_id,
        payload.rider_id,
        payload.delivery_status.as_deref(),
    )?;

    lifecycle::update_status(&state, update).await?;

    Ok(Json(json!({
        "message": "Delivery updated successfully",
        "delivery_id": update.delivery_id,
        "delivery_status": update.status,
    })))
}

async fn list_by_receiver_phone(
    State(state): State<Arc<AppState>>,
    Path(receiver_phone_number): Path<String>,
) -> Result<Response, AppError> {
    let deliveries = lifecycle::find_by_receiver_phone(&state, &receiver_phone_number).await?;
    Ok(non_empty(
        deliveries,
        "No deliveries found for the provided receiver_phone_number",
    ))
}

async fn list_by_sender(
    State(state): State<Arc<AppState>>,
    Path(sender_id): Path<String>,
) -> Result<Json<Vec<Delivery>>, AppError> {
    let sender_id = parse_id(&sender_id, "sender_id")?;
    Ok(Json(lifecycle::find_by_sender(&state, sender_id).await?))
}

async fn list_deliveries(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Delivery>>, AppError> {
    Ok(Json(lifecycle::list_all(&state).await?))
}
