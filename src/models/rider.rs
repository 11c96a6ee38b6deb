use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::geo::{decode_stored, GeoPoint, NullablePoint};

#[derive(Debug, Clone, Serialize)]
pub struct Rider {
    pub rider_id: i64,
    pub phone_number: String,
    pub name: String,
    pub rider_image: Option<String>,
    pub vehicle_registration: Option<String>,
    pub current_location: NullablePoint,
    pub availability_status: Option<String>,
    pub created_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for Rider {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let location: Option<String> = row.try_get("current_location")?;

        Ok(Self {
            rider_id: row.try_get("rider_id")?,
            phone_number: row.try_get("phone_number")?,
            name: row.try_get("name")?,
            rider_image: row.try_get("rider_image")?,
            vehicle_registration: row.try_get("vehicle_registration")?,
            current_location: decode_stored(location.as_deref()),
            availability_status: row.try_get("availability_status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewRider {
    pub phone_number: String,
    pub password: String,
    pub name: String,
    pub rider_image: Option<String>,
    pub vehicle_registration: Option<String>,
    pub current_location: Option<GeoPoint>,
    pub availability_status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RiderChanges {
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub rider_image: Option<String>,
    pub vehicle_registration: Option<String>,
    pub current_location: Option<GeoPoint>,
    pub availability_status: Option<String>,
}
