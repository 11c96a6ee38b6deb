use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::rest::form::FormData;
use crate::api::rest::{parse_id, release_on_failure, store_upload};
use crate::db::users;
use crate::error::AppError;
use crate::models::user::{NewUser, User, UserChanges};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/login", post(login))
        .route("/users/phone/:phone_number", get(get_receiver_by_phone))
        .route("/users/:user_id", get(get_user).put(update_user))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub phone_number: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn into_parts(self) -> Result<(String, String), AppError> {
        match (self.phone_number, self.password) {
            (Some(phone), Some(password)) if !phone.trim().is_empty() => Ok((phone, password)),
            _ => Err(AppError::Validation(
                "phone_number and password are required".to_string(),
            )),
        }
    }
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut form = FormData::read(multipart, "user_image").await?;

    let mut user = NewUser {
        phone_number: form.required("phone_number")?,
        password: form.required("password")?,
        name: form.required("name")?,
        user_image: None,
        address: form.text("address"),
        gps_location: form.point("gps_location")?,
        user_type: form.required("user_type")?,
    };

    user.user_image = store_upload(&state, form.take_file()).await?;
    let result = users::create(state.db.pool(), &user).await;
    let user_id = release_on_failure(&state, user.user_image.as_deref(), result).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created", "user_id": user_id })),
    ))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let mut form = FormData::read(multipart, "user_image").await?;
    if form.is_empty() {
        return Err(AppError::Validation("no fields to update".to_string()));
    }

    let mut changes = UserChanges {
        phone_number: form.text("phone_number"),
        password: form.text("password"),
        name: form.text("name"),
        user_image: None,
        address: form.text("address"),
        gps_location: form.point("gps_location")?,
        user_type: form.text("user_type"),
    };

    changes.user_image = store_upload(&state, form.take_file()).await?;
    let result = users::update(state.db.pool(), user_id, &changes).await;
    release_on_failure(&state, changes.user_image.as_deref(), result).await?;

    Ok(Json(json!({ "message": "User updated successfully" })))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let (phone_number, password) = payload.into_parts()?;

    let user = users::find_by_credential(state.db.pool(), &phone_number, &password).await?;

    Ok(Json(json!({ "message": "Login successful", "user": user })))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let user = users::get(state.db.pool(), user_id).await?;

    Ok(Json(json!({ "message": "User found", "user": user })))
}

async fn get_receiver_by_phone(
    State(state): State<Arc<AppState>>,
    Path(phone_number): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user = users::get_receiver_by_phone(state.db.pool(), &phone_number)
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::NotFound(_) => {
                AppError::NotFound("User not found or user is not a Receiver".to_string())
            }
            other => other,
        })?;

    Ok(Json(json!({ "message": "User found", "user": user })))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(users::list_all(state.db.pool()).await?))
}
