use sqlx::SqlitePool;

use crate::db::{write_error, DbError, Result};
use crate::geo::{encode, GeoPoint};
use crate::models::location::LocationRecord;

/// Appends a position ping and moves the rider's current location with it.
pub async fn record(pool: &SqlitePool, delivery_id: i64, rider_id: i64, point: &GeoPoint) -> Result<i64> {
    let location = encode(point)?;
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO location_tracking (delivery_id, rider_id, rider_location)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(delivery_id)
    .bind(rider_id)
    .bind(&location)
    .execute(&mut *tx)
    .await
    .map_err(write_error("LocationRecord"))?;

    sqlx::query(
        r#"
        UPDATE riders
        SET current_location = ?
        WHERE rider_id = ?
        "#,
    )
    .bind(&location)
    .bind(rider_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(result.last_insert_rowid())
}

/// The most recent ping for a rider, which is its current position.
pub async fn latest_for_rider(pool: &SqlitePool, rider_id: i64) -> Result<LocationRecord> {
    sqlx::query_as::<_, LocationRecord>(
        r#"
        SELECT track_id, delivery_id, rider_id, rider_location, timestamp
        FROM location_tracking
        WHERE rider_id = ?
        ORDER BY timestamp DESC, track_id DESC
        LIMIT 1
        "#,
    )
    .bind(rider_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::NotFound {
        entity: "LocationRecord",
        id: rider_id.to_string(),
    })
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<LocationRecord>> {
    let records = sqlx::query_as::<_, LocationRecord>(
        r#"
        SELECT track_id, delivery_id, rider_id, rider_location, timestamp
        FROM location_tracking
        ORDER BY track_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}
