use sqlx::SqlitePool;

use crate::db::{write_error, DbError, Result};
use crate::geo::encode;
use crate::models::rider::{NewRider, Rider, RiderChanges};

pub async fn create(pool: &SqlitePool, rider: &NewRider) -> Result<i64> {
    let location = rider.current_location.as_ref().map(encode).transpose()?;

    let result = sqlx::query(
        r#"
        INSERT INTO riders (phone_number, password, name, rider_image, vehicle_registration, current_location, availability_status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&rider.phone_number)
    .bind(&rider.password)
    .bind(&rider.name)
    .bind(&rider.rider_image)
    .bind(&rider.vehicle_registration)
    .bind(location)
    .bind(&rider.availability_status)
    .execute(pool)
    .await
    .map_err(write_error("Rider"))?;

    Ok(result.last_insert_rowid())
}

pub async fn get(pool: &SqlitePool, rider_id: i64) -> Result<Rider> {
    sqlx::query_as::<_, Rider>(
        r#"
        SELECT rider_id, phone_number, name, rider_image, vehicle_registration,
               current_location, availability_status, created_at
        FROM riders
        WHERE rider_id = ?
        "#,
    )
    .bind(rider_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::NotFound {
        entity: "Rider",
        id: rider_id.to_string(),
    })
}

pub async fn find_by_credential(pool: &SqlitePool, phone_number: &str, password: &str) -> Result<Rider> {
    sqlx::query_as::<_, Rider>(
        r#"
        SELECT rider_id, phone_number, name, rider_image, vehicle_registration,
               current_location, availability_status, created_at
        FROM riders
        WHERE phone_number = ? AND password = ?
        ORDER BY rider_id
        LIMIT 1
        "#,
    )
    .bind(phone_number)
    .bind(password)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::InvalidCredential)
}

/// Applies only the supplied fields; a rider keeps its image unless a new one is given.
pub async fn update(pool: &SqlitePool, rider_id: i64, changes: &RiderChanges) -> Result<()> {
    let location = changes.current_location.as_ref().map(encode).transpose()?;

    let result = sqlx::query(
        r#"
        UPDATE riders
        SET phone_number = COALESCE(?, phone_number),
            password = COALESCE(?, password),
            name = COALESCE(?, name),
            rider_image = COALESCE(?, rider_image),
            vehicle_registration = COALESCE(?, vehicle_registration),
            current_location = COALESCE(?, current_location),
            availability_status = COALESCE(?, availability_status)
        WHERE rider_id = ?
        "#,
    )
    .bind(&changes.phone_number)
    .bind(&changes.password)
    .bind(&changes.name)
    .bind(&changes.rider_image)
    .bind(&changes.vehicle_registration)
    .bind(location)
    .bind(&changes.availability_status)
    .bind(rider_id)
    .execute(pool)
    .await
    .map_err(write_error("Rider"))?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound {
            entity: "Rider",
            id: rider_id.to_string(),
        });
    }

    Ok(())
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Rider>> {
    let riders = sqlx::query_as::<_, Rider>(
        r#"
        SELECT rider_id, phone_number, name, rider_image, vehicle_registration,
               current_location, availability_status, created_at
        FROM riders
        ORDER BY rider_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(riders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{new_rider, test_db};

    #[tokio::test]
    async fn new_rider_has_null_location() {
        let db = test_db().await;
        let id = create(db.pool(), &new_rider("0900000001")).await.unwrap();

        let rider = get(db.pool(), id).await.unwrap();
        assert_eq!(rider.current_location.x, None);
        assert_eq!(rider.current_location.y, None);
    }

    #[tokio::test]
    async fn update_without_image_keeps_stored_image() {
        let db = test_db().await;
        let id = create(db.pool(), &new_rider("0900000002")).await.unwrap();

        let changes = RiderChanges {
            availability_status: Some("busy".to_string()),
            ..Default::default()
        };
        update(db.pool(), id, &changes).await.unwrap();

        let rider = get(db.pool(), id).await.unwrap();
        assert_eq!(rider.rider_image.as_deref(), Some("uploads/rider.jpg"));
        assert_eq!(rider.availability_status.as_deref(), Some("busy"));
    }

    #[tokio::test]
    async fn update_with_image_replaces_it() {
        let db = test_db().await;
        let id = create(db.pool(), &new_rider("0900000003")).await.unwrap();

        let changes = RiderChanges {
            rider_image: Some("uploads/new.jpg".to_string()),
            ..Default::default()
        };
        update(db.pool(), id, &changes).await.unwrap();

        let rider = get(db.pool(), id).await.unwrap();
        assert_eq!(rider.rider_image.as_deref(), Some("uploads/new.jpg"));
    }

    #[tokio::test]
    async fn login_with_wrong_secret_fails() {
        let db = test_db().await;
        create(db.pool(), &new_rider("0800000000")).await.unwrap();

        let result = find_by_credential(db.pool(), "0800000000", "wrongsecret").await;
        assert!(matches!(result, Err(DbError::InvalidCredential)));
    }
}
