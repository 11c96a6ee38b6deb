use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde_json::{json, Value};

use crate::api::rest::form::FormData;
use crate::api::rest::{parse_id, release_on_failure, store_upload};
use crate::db::multi_item_orders;
use crate::error::AppError;
use crate::models::multi_item_order::MultiItemOrder;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/multi_item_orders", post(create_order))
        .route(
            "/multi_item_orders/multi-item-orders/:delivery_id",
            get(list_by_delivery),
        )
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut form = FormData::read(multipart, "item_image").await?;
    let delivery_id = form.required_int("delivery_id")?;
    let item_description = form.required("item_description")?;

    let item_image = store_upload(&state, form.take_file()).await?;
    let result = multi_item_orders::create(
        state.db.pool(),
        delivery_id,
        &item_description,
        item_image.as_deref(),
    )
    .await;
    let order_id = release_on_failure(&state, item_image.as_deref(), result).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Multi-item order created", "order_id": order_id })),
    ))
}

async fn list_by_delivery(
    State(state): State<Arc<AppState>>,
    Path(delivery_id): Path<String>,
) -> Result<Json<Vec<MultiItemOrder>>, AppError> {
    let delivery_id = parse_id(&delivery_id, "delivery_id")?;
    Ok(Json(
        multi_item_orders::list_by_delivery(state.db.pool(), delivery_id).await?,
    ))
}
