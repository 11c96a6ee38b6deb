use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use parcel_dispatch::api::rest::router;
use parcel_dispatch::db::Database;
use parcel_dispatch::state::AppState;
use parcel_dispatch::storage::ImageStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----parcel-dispatch-test-boundary";

struct TestApp {
    app: axum::Router,
    uploads: TempDir,
}

async fn setup() -> TestApp {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();

    let uploads = tempfile::tempdir().unwrap();
    let images = ImageStore::open(uploads.path()).await.unwrap();
    let state = Arc::new(AppState::new(db, images, 1024 * 1024));

    TestApp {
        app: router(state),
        uploads,
    }
}

struct FilePart<'a> {
    field: &'a str,
    file_name: &'a str,
    bytes: &'a [u8],
}

fn multipart_request(method: &str, uri: &str, fields: &[(&str, &str)], file: Option<FilePart>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                file.field, file.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn create_user(app: &axum::Router, phone: &str, user_type: &str) -> i64 {
    let (status, body) = send(
        app,
        multipart_request(
            "POST",
            "/users",
            &[
                ("phone_number", phone),
                ("password", "secret"),
                ("name", "Somchai"),
                ("address", "12 Sukhumvit Rd"),
                ("gps_location", r#"{"x": 13.7, "y": 100.5}"#),
                ("user_type", user_type),
            ],
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["user_id"].as_i64().unwrap()
}

async fn create_rider(app: &axum::Router, phone: &str, image: Option<FilePart<'_>>) -> i64 {
    let (status, body) = send(
        app,
        multipart_request(
            "POST",
            "/riders",
            &[
                ("phone_number", phone),
                ("password", "secret"),
                ("name", "Niran"),
                ("vehicle_registration", "1AB 1234"),
                ("availability_status", "available"),
            ],
            image,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["rider_id"].as_i64().unwrap()
}

async fn create_delivery(app: &axum::Router, sender_id: i64) -> i64 {
    let sender = sender_id.to_string();
    let (status, body) = send(
        app,
        multipart_request(
            "POST",
            "/deliveries",
            &[
                ("sender_id", &sender),
                ("receiver_phone_number", "0899999999"),
                ("delivery_status", "awaiting rider"),
                ("pickup_address", "A"),
                ("pickup_gps[x]", "13.7"),
                ("pickup_gps[y]", "100.5"),
                ("dropoff_address", "B"),
                ("dropoff_gps", r#"{"x": 13.8, "y": 100.6}"#),
            ],
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["delivery_id"].as_i64().unwrap()
}

fn update_delivery(delivery_id: i64, rider_id: i64, status: &str) -> Request<Body> {
    json_request(
        "PUT",
        "/deliveries/update-delivery",
        json!({ "delivery_id": delivery_id, "rider_id": rider_id, "delivery_status": status }),
    )
}

#[tokio::test]
async fn health_returns_ok() {
    let t = setup().await;
    let (status, body) = send(&t.app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let t = setup().await;
    let response = t.app.clone().oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.contains("text/plain"));

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("deliveries_created_total"));
}

#[tokio::test]
async fn created_user_is_returned_without_secret() {
    let t = setup().await;
    let user_id = create_user(&t.app, "0811111111", "Sender").await;

    let (status, body) = send(&t.app, get_request(&format!("/users/{user_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User found");
    assert_eq!(body["user"]["gps_location"]["x"], 13.7);
    assert_eq!(body["user"]["gps_location"]["y"], 100.5);
    assert!(body["user"].get("password").is_none());

    let (status, body) = send(&t.app, get_request("/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_user_without_name_returns_400() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        multipart_request(
            "POST",
            "/users",
            &[("phone_number", "0811111111"), ("password", "x"), ("user_type", "Sender")],
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "name is required");
}

#[tokio::test]
async fn create_user_with_half_a_point_returns_400() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        multipart_request(
            "POST",
            "/users",
            &[
                ("phone_number", "0811111111"),
                ("password", "x"),
                ("name", "Somchai"),
                ("gps_location[x]", "13.7"),
                ("user_type", "Sender"),
            ],
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_user_returns_404() {
    let t = setup().await;
    let (status, body) = send(&t.app, get_request("/users/41")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let t = setup().await;
    create_user(&t.app, "0800000000", "Sender").await;

    let (wrong_status, wrong_body) = send(
        &t.app,
        json_request(
            "POST",
            "/users/login",
            json!({ "phone_number": "0800000000", "password": "wrongsecret" }),
        ),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &t.app,
        json_request(
            "POST",
            "/users/login",
            json!({ "phone_number": "0000000000", "password": "anything" }),
        ),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["message"], "Invalid phone number or password");
}

#[tokio::test]
async fn rider_login_succeeds_with_matching_secret() {
    let t = setup().await;
    let rider_id = create_rider(&t.app, "0900000001", None).await;

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/riders/login",
            json!({ "phone_number": "0900000001", "password": "secret" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["rider"]["rider_id"], rider_id);
    assert!(body["rider"].get("password").is_none());
}

#[tokio::test]
async fn login_without_password_returns_400() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        json_request("POST", "/riders/login", json!({ "phone_number": "0900000001" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn phone_lookup_only_finds_receivers() {
    let t = setup().await;
    create_user(&t.app, "0822222222", "Sender").await;
    create_user(&t.app, "0833333333", "Receiver").await;

    let (status, body) = send(&t.app, get_request("/users/phone/0822222222")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found or user is not a Receiver");

    let (status, body) = send(&t.app, get_request("/users/phone/0833333333")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["user_type"], "Receiver");
}

#[tokio::test]
async fn rider_image_survives_update_without_file() {
    let t = setup().await;
    let rider_id = create_rider(
        &t.app,
        "0900000001",
        Some(FilePart {
            field: "rider_image",
            file_name: "face.jpg",
            bytes: b"first",
        }),
    )
    .await;

    let (_, body) = send(&t.app, get_request(&format!("/riders/{rider_id}"))).await;
    let original = body["rider"]["rider_image"].as_str().unwrap().to_string();
    assert!(original.starts_with("uploads/"));
    let stored = t.uploads.path().join(original.trim_start_matches("uploads/"));
    assert_eq!(std::fs::read(stored).unwrap(), b"first");

    let (status, _) = send(
        &t.app,
        multipart_request(
            "PUT",
            &format!("/riders/{rider_id}"),
            &[("availability_status", "busy")],
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&t.app, get_request(&format!("/riders/{rider_id}"))).await;
    assert_eq!(body["rider"]["rider_image"], original.as_str());
    assert_eq!(body["rider"]["availability_status"], "busy");

    let (status, _) = send(
        &t.app,
        multipart_request(
            "PUT",
            &format!("/riders/{rider_id}"),
            &[],
            Some(FilePart {
                field: "rider_image",
                file_name: "new-face.png",
                bytes: b"second",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&t.app, get_request(&format!("/riders/{rider_id}"))).await;
    let replaced = body["rider"]["rider_image"].as_str().unwrap();
    assert_ne!(replaced, original);
    assert!(replaced.ends_with(".png"));
}

#[tokio::test]
async fn update_of_missing_rider_returns_404() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        multipart_request("PUT", "/riders/12", &[("name", "Ghost")], None),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploaded_images_are_served() {
    let t = setup().await;
    let rider_id = create_rider(
        &t.app,
        "0900000001",
        Some(FilePart {
            field: "rider_image",
            file_name: "face.jpg",
            bytes: b"jpeg-bytes",
        }),
    )
    .await;

    let (_, body) = send(&t.app, get_request(&format!("/riders/{rider_id}"))).await;
    let path = body["rider"]["rider_image"].as_str().unwrap();

    let response = t.app.clone().oneshot(get_request(&format!("/{path}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"jpeg-bytes");
}

#[tokio::test]
async fn non_multipart_body_on_upload_route_returns_400() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        json_request("POST", "/riders", json!({ "phone_number": "0900000001" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn two_files_in_one_request_are_rejected() {
    let t = setup().await;
    let mut request = multipart_request("POST", "/riders", &[], None);
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"rider_image\"; filename=\"a.jpg\"\r\n\r\na\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"rider_image\"; filename=\"b.jpg\"\r\n\r\nb\r\n\
         --{BOUNDARY}--\r\n"
    );
    *request.body_mut() = Body::from(body);

    let (status, _) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delivery_round_trips_points_and_starts_unassigned() {
    let t = setup().await;
    let sender = create_user(&t.app, "0811111111", "Sender").await;
    let delivery_id = create_delivery(&t.app, sender).await;

    let (status, body) = send(&t.app, get_request("/deliveries/receiver_phone/0899999999")).await;
    assert_eq!(status, StatusCode::OK);
    let delivery = &body.as_array().unwrap()[0];
    assert_eq!(delivery["delivery_id"], delivery_id);
    assert_eq!(delivery["delivery_status"], "awaiting rider");
    assert!(delivery["rider_id"].is_null());
    assert_eq!(delivery["pickup_gps"], json!({ "x": 13.7, "y": 100.5 }));
    assert_eq!(delivery["dropoff_gps"], json!({ "x": 13.8, "y": 100.6 }));

    let (status, body) = send(&t.app, get_request(&format!("/deliveries/{sender}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delivery_for_unknown_sender_returns_400() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        multipart_request(
            "POST",
            "/deliveries",
            &[
                ("sender_id", "404"),
                ("receiver_phone_number", "0899999999"),
                ("pickup_address", "A"),
                ("pickup_gps", r#"{"x": 1, "y": 2}"#),
                ("dropoff_address", "B"),
                ("dropoff_gps", r#"{"x": 3, "y": 4}"#),
            ],
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn delivery_cannot_start_in_a_later_status() {
    let t = setup().await;
    let sender = create_user(&t.app, "0811111111", "Sender").await;
    let sender = sender.to_string();
    let (status, _) = send(
        &t.app,
        multipart_request(
            "POST",
            "/deliveries",
            &[
                ("sender_id", &sender),
                ("receiver_phone_number", "0899999999"),
                ("delivery_status", "delivered"),
                ("pickup_address", "A"),
                ("pickup_gps", r#"{"x": 1, "y": 2}"#),
                ("dropoff_address", "B"),
                ("dropoff_gps", r#"{"x": 3, "y": 4}"#),
            ],
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn second_claim_is_rejected_with_409() {
    let t = setup().await;
    let sender = create_user(&t.app, "0811111111", "Sender").await;
    let rider_a = create_rider(&t.app, "0900000001", None).await;
    let rider_b = create_rider(&t.app, "0900000002", None).await;
    let delivery_id = create_delivery(&t.app, sender).await;

    let (status, body) = send(&t.app, get_request("/deliveries/pending-deliveries")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (first, _) = send(&t.app, update_delivery(delivery_id, rider_a, "assigned")).await;
    let (second, body) = send(&t.app, update_delivery(delivery_id, rider_b, "assigned")).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("already been claimed"));

    let (status, body) = send(&t.app, get_request("/deliveries/pending-deliveries")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No pending deliveries found");

    let (_, body) = send(&t.app, get_request("/deliveries")).await;
    assert_eq!(body[0]["rider_id"], rider_a);
    assert_eq!(body[0]["delivery_status"], "assigned");
}

#[tokio::test]
async fn claim_of_missing_delivery_returns_404() {
    let t = setup().await;
    let rider = create_rider(&t.app, "0900000001", None).await;
    let (status, _) = send(&t.app, update_delivery(77, rider, "assigned")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_delivery_requires_all_fields() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        json_request(
            "PUT",
            "/deliveries/update-delivery",
            json!({ "delivery_id": 1, "delivery_status": "assigned" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "delivery_id, rider_id, and delivery_status are required");
}

#[tokio::test]
async fn assigned_rider_completes_delivery_in_order() {
    let t = setup().await;
    let sender = create_user(&t.app, "0811111111", "Sender").await;
    let rider = create_rider(&t.app, "0900000001", None).await;
    let delivery_id = create_delivery(&t.app, sender).await;

    let (status, _) = send(&t.app, update_delivery(delivery_id, rider, "assigned")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&t.app, update_delivery(delivery_id, rider, "delivered")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    for step in ["picked up", "in transit", "delivered"] {
        let (status, body) = send(&t.app, update_delivery(delivery_id, rider, step)).await;
        assert_eq!(status, StatusCode::OK, "{step}: {body}");
        assert_eq!(body["delivery_status"], step);
    }
}

#[tokio::test]
async fn non_numeric_sender_returns_400() {
    let t = setup().await;
    let (status, body) = send(&t.app, get_request("/deliveries/abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid sender_id. It must be a number.");
}

#[tokio::test]
async fn sender_without_deliveries_gets_empty_list() {
    let t = setup().await;
    let (status, body) = send(&t.app, get_request("/deliveries/5")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn latest_ping_is_the_rider_location() {
    let t = setup().await;
    let sender = create_user(&t.app, "0811111111", "Sender").await;
    let rider = create_rider(&t.app, "0900000001", None).await;
    let delivery_id = create_delivery(&t.app, sender).await;

    for (x, y) in [(13.70, 100.50), (13.72, 100.52)] {
        let (status, body) = send(
            &t.app,
            json_request(
                "POST",
                "/location_tracking",
                json!({ "delivery_id": delivery_id, "rider_id": rider, "rider_location": { "x": x, "y": y } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["track_id"].is_i64());
    }

    let (status, body) = send(
        &t.app,
        get_request(&format!("/location_tracking/rider-location/{rider}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rider_location"], json!({ "x": 13.72, "y": 100.52 }));

    let (_, body) = send(&t.app, get_request(&format!("/riders/{rider}"))).await;
    assert_eq!(body["rider"]["current_location"], json!({ "x": 13.72, "y": 100.52 }));

    let (_, body) = send(&t.app, get_request("/location_tracking")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn ping_without_y_returns_400() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        json_request(
            "POST",
            "/location_tracking",
            json!({ "delivery_id": 1, "rider_id": 1, "rider_location": { "x": 13.7 } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rider_without_pings_returns_404() {
    let t = setup().await;
    let (status, body) = send(&t.app, get_request("/location_tracking/rider-location/3")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No location found for this rider");
}

#[tokio::test]
async fn delivery_image_lifecycle() {
    let t = setup().await;
    let sender = create_user(&t.app, "0811111111", "Sender").await;
    let delivery_id = create_delivery(&t.app, sender).await;
    let delivery = delivery_id.to_string();

    let (status, _) = send(
        &t.app,
        multipart_request(
            "POST",
            "/delivery_images",
            &[("delivery_id", &delivery), ("status", "picked up")],
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &t.app,
        multipart_request(
            "POST",
            "/delivery_images",
            &[("delivery_id", &delivery), ("status", "picked up")],
            Some(FilePart {
                field: "image_url",
                file_name: "pickup.jpg",
                bytes: b"pickup",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let image_id = body["image_id"].as_i64().unwrap();

    let (status, _) = send(
        &t.app,
        multipart_request(
            "PUT",
            &format!("/delivery_images/update-status/{image_id}"),
            &[("status", "delivered")],
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&t.app, get_request("/delivery_images/receiver_phone/0899999999")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], "delivered");
    assert!(body[0]["image_url"].as_str().unwrap().ends_with(".jpg"));

    let (status, _) = send(&t.app, get_request("/delivery_images/receiver_phone/0000000000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delivery_image_is_fetched_by_id() {
    let t = setup().await;
    let sender = create_user(&t.app, "0811111111", "Sender").await;
    let delivery = create_delivery(&t.app, sender).await.to_string();

    let (_, body) = send(
        &t.app,
        multipart_request(
            "POST",
            "/delivery_images",
            &[("delivery_id", &delivery), ("status", "picked up")],
            Some(FilePart {
                field: "image_url",
                file_name: "pickup.png",
                bytes: b"pickup",
            }),
        ),
    )
    .await;
    let image_id = body["image_id"].as_i64().unwrap();

    let (status, body) = send(&t.app, get_request(&format!("/delivery_images/{image_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image found");
    assert_eq!(body["image"]["status"], "picked up");

    let (status, _) = send(&t.app, get_request("/delivery_images/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_status_update_requires_status() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        multipart_request("PUT", "/delivery_images/update-status/1", &[], None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Status is required");
}

#[tokio::test]
async fn image_for_unknown_delivery_leaves_no_file() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        multipart_request(
            "POST",
            "/delivery_images",
            &[("delivery_id", "999"), ("status", "picked up")],
            Some(FilePart {
                field: "image_url",
                file_name: "orphan.jpg",
                bytes: b"orphan",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(t.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn multi_item_orders_are_listed_per_delivery() {
    let t = setup().await;
    let sender = create_user(&t.app, "0811111111", "Sender").await;
    let delivery_id = create_delivery(&t.app, sender).await;
    let delivery = delivery_id.to_string();

    for item in ["rice 5kg", "fish sauce"] {
        let (status, body) = send(
            &t.app,
            multipart_request(
                "POST",
                "/multi_item_orders",
                &[("delivery_id", &delivery), ("item_description", item)],
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["order_id"].is_i64());
    }

    let (status, body) = send(
        &t.app,
        get_request(&format!("/multi_item_orders/multi-item-orders/{delivery_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line["item_description"].as_str().unwrap())
        .collect();
    assert_eq!(items, vec!["rice 5kg", "fish sauce"]);
}
