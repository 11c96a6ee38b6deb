use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::geo::{decode_stored, GeoPoint, NullablePoint};

pub const RECEIVER_USER_TYPE: &str = "Receiver";

/// A user as returned to clients. The credential secret never leaves storage.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub user_id: i64,
    pub phone_number: String,
    pub name: String,
    pub user_image: Option<String>,
    pub address: Option<String>,
    pub gps_location: NullablePoint,
    pub user_type: String,
    pub created_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let gps: Option<String> = row.try_get("gps_location")?;

        Ok(Self {
            user_id: row.try_get("user_id")?,
            phone_number: row.try_get("phone_number")?,
            name: row.try_get("name")?,
            user_image: row.try_get("user_image")?,
            address: row.try_get("address")?,
            gps_location: decode_stored(gps.as_deref()),
            user_type: row.try_get("user_type")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub phone_number: String,
    pub password: String,
    pub name: String,
    pub user_image: Option<String>,
    pub address: Option<String>,
    pub gps_location: Option<GeoPoint>,
    pub user_type: String,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub user_image: Option<String>,
    pub address: Option<String>,
    pub gps_location: Option<GeoPoint>,
    pub user_type: Option<String>,
}
