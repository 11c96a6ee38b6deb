use sqlx::SqlitePool;

use crate::db::{write_error, DbError, Result};
use crate::models::delivery_image::DeliveryImage;

pub async fn create(pool: &SqlitePool, delivery_id: i64, image_url: &str, status: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO delivery_images (delivery_id, image_url, status)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(delivery_id)
    .bind(image_url)
    .bind(status)
    .execute(pool)
    .await
    .map_err(write_error("DeliveryImage"))?;

    Ok(result.last_insert_rowid())
}

pub async fn get(pool: &SqlitePool, image_id: i64) -> Result<DeliveryImage> {
    sqlx::query_as::<_, DeliveryImage>(
        r#"
        SELECT image_id, delivery_id, image_url, status, uploaded_at
        FROM delivery_images
        WHERE image_id = ?
        "#,
    )
    .bind(image_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::NotFound {
        entity: "DeliveryImage",
        id: image_id.to_string(),
    })
}

/// Changes the status label, and the image too when `image_url` is given.
pub async fn update(pool: &SqlitePool, image_id: i64, status: &str, image_url: Option<&str>) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE delivery_images
        SET status = ?, image_url = COALESCE(?, image_url)
        WHERE image_id = ?
        "#,
    )
    .bind(status)
    .bind(image_url)
    .bind(image_id)
    .execute(pool)
    .await
    .map_err(write_error("DeliveryImage"))?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound {
            entity: "DeliveryImage",
            id: image_id.to_string(),
        });
    }

    Ok(())
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DeliveryImage>> {
    let images = sqlx::query_as::<_, DeliveryImage>(
        r#"
        SELECT image_id, delivery_id, image_url, status, uploaded_at
        FROM delivery_images
        ORDER BY image_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(images)
}

/// Images attached to any delivery addressed to `phone_number`.
pub async fn list_by_receiver_phone(pool: &SqlitePool, phone_number: &str) -> Result<Vec<DeliveryImage>> {
    let images = sqlx::query_as::<_, DeliveryImage>(
        r#"
        SELECT di.image_id, di.delivery_id, di.image_url, di.status, di.uploaded_at
        FROM delivery_images di
        JOIN deliveries d ON di.delivery_id = d.delivery_id
        WHERE d.receiver_phone_number = ?
        ORDER BY di.image_id
        "#,
    )
    .bind(phone_number)
    .fetch_all(pool)
    .await?;

    Ok(images)
}
