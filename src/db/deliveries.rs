//! Delivery rows. Status changes are conditional writes; the lifecycle rules
//! deciding which writes to attempt live in `engine::lifecycle`.

use sqlx::SqlitePool;

use crate::db::{write_error, DbError, Result};
use crate::geo::encode;
use crate::models::delivery::{Delivery, DeliveryStatus, NewDelivery};

pub async fn create(pool: &SqlitePool, delivery: &NewDelivery) -> Result<i64> {
    let pickup = encode(&delivery.pickup.point)?;
    let dropoff = encode(&delivery.dropoff.point)?;

    let result = sqlx::query(
        r#"
        INSERT INTO deliveries (sender_id, receiver_phone_number, delivery_status, product_image,
                                pickup_address, pickup_gps, dropoff_address, dropoff_gps, rider_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL)
        "#,
    )
    .bind(delivery.sender_id)
    .bind(&delivery.receiver_phone_number)
    .bind(DeliveryStatus::AwaitingRider)
    .bind(&delivery.product_image)
    .bind(&delivery.pickup.address)
    .bind(pickup)
    .bind(&delivery.dropoff.address)
    .bind(dropoff)
    .execute(pool)
    .await
    .map_err(write_error("Delivery"))?;

    Ok(result.last_insert_rowid())
}

pub async fn get(pool: &SqlitePool, delivery_id: i64) -> Result<Delivery> {
    sqlx::query_as::<_, Delivery>(
        r#"
        SELECT delivery_id, sender_id, receiver_phone_number, delivery_status, product_image,
               pickup_address, pickup_gps, dropoff_address, dropoff_gps, rider_id,
               created_at, updated_at
        FROM deliveries
        WHERE delivery_id = ?
        "#,
    )
    .bind(delivery_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::NotFound {
        entity: "Delivery",
        id: delivery_id.to_string(),
    })
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Delivery>> {
    let deliveries = sqlx::query_as::<_, Delivery>(
        r#"
        SELECT delivery_id, sender_id, receiver_phone_number, delivery_status, product_image,
               pickup_address, pickup_gps, dropoff_address, dropoff_gps, rider_id,
               created_at, updated_at
        FROM deliveries
        ORDER BY delivery_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(deliveries)
}

/// Deliveries still waiting for a rider and not yet claimed by one.
pub async fn list_pending(pool: &SqlitePool) -> Result<Vec<Delivery>> {
    let deliveries = sqlx::query_as::<_, Delivery>(
        r#"
        SELECT delivery_id, sender_id, receiver_phone_number, delivery_status, product_image,
               pickup_address, pickup_gps, dropoff_address, dropoff_gps, rider_id,
               created_at, updated_at
        FROM deliveries
        WHERE delivery_status = ? AND rider_id IS NULL
        ORDER BY delivery_id
        "#,
    )
    .bind(DeliveryStatus::AwaitingRider)
    .fetch_all(pool)
    .await?;

    Ok(deliveries)
}

pub async fn list_by_sender(pool: &SqlitePool, sender_id: i64) -> Result<Vec<Delivery>> {
    let deliveries = sqlx::query_as::<_, Delivery>(
        r#"
        SELECT delivery_id, sender_id, receiver_phone_number, delivery_status, product_image,
               pickup_address, pickup_gps, dropoff_address, dropoff_gps, rider_id,
               created_at, updated_at
        FROM deliveries
        WHERE sender_id = ?
        ORDER BY delivery_id
        "#,
    )
    .bind(sender_id)
    .fetch_all(pool)
    .await?;

    Ok(deliveries)
}

pub async fn list_by_receiver_phone(pool: &SqlitePool, phone_number: &str) -> Result<Vec<Delivery>> {
    let deliveries = sqlx::query_as::<_, Delivery>(
        r#"
        SELECT delivery_id, sender_id, receiver_phone_number, delivery_status, product_image,
               pickup_address, pickup_gps, dropoff_address, dropoff_gps, rider_id,
               created_at, updated_at
        FROM deliveries
        WHERE receiver_phone_number = ?
        ORDER BY delivery_id
        "#,
    )
    .bind(phone_number)
    .fetch_all(pool)
    .await?;

    Ok(deliveries)
}

/// Sets rider and status in one statement, only while the delivery is unclaimed.
///
/// Returns `false` when no row matched: the delivery is missing or already claimed.
pub async fn claim(
    pool: &SqlitePool,
    delivery_id: i64,
    rider_id: i64,
    status: DeliveryStatus,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE deliveries
        SET rider_id = ?, delivery_status = ?, updated_at = CURRENT_TIMESTAMP
        WHERE delivery_id = ? AND rider_id IS NULL AND delivery_status = ?
        "#,
    )
    .bind(rider_id)
    .bind(status)
    .bind(delivery_id)
    .bind(DeliveryStatus::AwaitingRider)
    .execute(pool)
    .await
    .map_err(write_error("Delivery"))?;

    Ok(result.rows_affected() > 0)
}

/// Moves a delivery to `next` only if its status and rider still equal what
/// the caller observed.
pub async fn compare_and_set_status(
    pool: &SqlitePool,
    delivery_id: i64,
    expected_status: DeliveryStatus,
    expected_rider: Option<i64>,
    next: DeliveryStatus,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE deliveries
        SET delivery_status = ?, updated_at = CURRENT_TIMESTAMP
        WHERE delivery_id = ? AND delivery_status = ? AND rider_id IS ?
        "#,
    )
    .bind(next)
    .bind(delivery_id)
    .bind(expected_status)
    .bind(expected_rider)
    .execute(pool)
    .await
    .map_err(write_error("Delivery"))?;

    Ok(result.rows_affected() > 0)
}
