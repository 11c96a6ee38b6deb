use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::geo::{decode_stored, NullablePoint};

/// One rider position ping. Records are never modified after insertion.
#[derive(Debug, Clone, Serialize)]
pub struct LocationRecord {
    pub track_id: i64,
    pub delivery_id: i64,
    pub rider_id: i64,
    pub rider_location: NullablePoint,
    pub timestamp: String,
}

impl<'r> FromRow<'r, SqliteRow> for LocationRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let location: Option<String> = row.try_get("rider_location")?;

        Ok(Self {
            track_id: row.try_get("track_id")?,
            delivery_id: row.try_get("delivery_id")?,
            rider_id: row.try_get("rider_id")?,
            rider_location: decode_stored(location.as_deref()),
            timestamp: row.try_get("timestamp")?,
        })
    }
}
