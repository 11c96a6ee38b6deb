//! User records. Secrets are compared as stored; see DESIGN.md.

use sqlx::SqlitePool;

use crate::db::{write_error, DbError, Result};
use crate::geo::encode;
use crate::models::user::{NewUser, User, UserChanges, RECEIVER_USER_TYPE};

pub async fn create(pool: &SqlitePool, user: &NewUser) -> Result<i64> {
    let gps = user.gps_location.as_ref().map(encode).transpose()?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (phone_number, password, name, user_image, address, gps_location, user_type)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.phone_number)
    .bind(&user.password)
    .bind(&user.name)
    .bind(&user.user_image)
    .bind(&user.address)
    .bind(gps)
    .bind(&user.user_type)
    .execute(pool)
    .await
    .map_err(write_error("User"))?;

    Ok(result.last_insert_rowid())
}

pub async fn get(pool: &SqlitePool, user_id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, phone_number, name, user_image, address, gps_location, user_type, created_at
        FROM users
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::NotFound {
        entity: "User",
        id: user_id.to_string(),
    })
}

/// Looks up a user acting as a delivery receiver.
pub async fn get_receiver_by_phone(pool: &SqlitePool, phone_number: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, phone_number, name, user_image, address, gps_location, user_type, created_at
        FROM users
        WHERE phone_number = ? AND user_type = ?
        ORDER BY user_id
        LIMIT 1
        "#,
    )
    .bind(phone_number)
    .bind(RECEIVER_USER_TYPE)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::NotFound {
        entity: "Receiver",
        id: phone_number.to_string(),
    })
}

pub async fn find_by_credential(pool: &SqlitePool, phone_number: &str, password: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, phone_number, name, user_image, address, gps_location, user_type, created_at
        FROM users
        WHERE phone_number = ? AND password = ?
        ORDER BY user_id
        LIMIT 1
        "#,
    )
    .bind(phone_number)
    .bind(password)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::InvalidCredential)
}

/// Applies only the supplied fields.
pub async fn update(pool: &SqlitePool, user_id: i64, changes: &UserChanges) -> Result<()> {
    let gps = changes.gps_location.as_ref().map(encode).transpose()?;

    let result = sqlx::query(
        r#"
        UPDATE users
        SET phone_number = COALESCE(?, phone_number),
            password = COALESCE(?, password),
            name = COALESCE(?, name),
            user_image = COALESCE(?, user_image),
            address = COALESCE(?, address),
            gps_location = COALESCE(?, gps_location),
            user_type = COALESCE(?, user_type)
        WHERE user_id = ?
        "#,
    )
    .bind(&changes.phone_number)
    .bind(&changes.password)
    .bind(&changes.name)
    .bind(&changes.user_image)
    .bind(&changes.address)
    .bind(gps)
    .bind(&changes.user_type)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(write_error("User"))?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound {
            entity: "User",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, phone_number, name, user_image, address, gps_location, user_type, created_at
        FROM users
        ORDER BY user_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}
