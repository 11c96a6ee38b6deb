use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::geo::{decode_stored, GeoPoint, NullablePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum DeliveryStatus {
    #[serde(rename = "awaiting rider")]
    #[sqlx(rename = "awaiting rider")]
    AwaitingRider,
    #[serde(rename = "assigned")]
    #[sqlx(rename = "assigned")]
    Assigned,
    #[serde(rename = "picked up")]
    #[sqlx(rename = "picked up")]
    PickedUp,
    #[serde(rename = "in transit")]
    #[sqlx(rename = "in transit")]
    InTransit,
    #[serde(rename = "delivered")]
    #[sqlx(rename = "delivered")]
    Delivered,
    #[serde(rename = "cancelled")]
    #[sqlx(rename = "cancelled")]
    Cancelled,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 6] = [
        DeliveryStatus::AwaitingRider,
        DeliveryStatus::Assigned,
        DeliveryStatus::PickedUp,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
        DeliveryStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::AwaitingRider => "awaiting rider",
            DeliveryStatus::Assigned => "assigned",
            DeliveryStatus::PickedUp => "picked up",
            DeliveryStatus::InTransit => "in transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses reachable in one step from `self`.
    pub const fn next_statuses(&self) -> &'static [DeliveryStatus] {
        match self {
            DeliveryStatus::AwaitingRider => &[DeliveryStatus::Assigned, DeliveryStatus::Cancelled],
            DeliveryStatus::Assigned => &[DeliveryStatus::PickedUp, DeliveryStatus::Cancelled],
            DeliveryStatus::PickedUp => &[DeliveryStatus::InTransit],
            DeliveryStatus::InTransit => &[DeliveryStatus::Delivered],
            DeliveryStatus::Delivered | DeliveryStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        self.next_statuses().contains(&next)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase().replace(['_', '-'], " ");
        DeliveryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = DeliveryStatus::ALL.iter().map(|s| s.as_str()).collect();
                format!("unknown delivery status: {raw}, expected one of {}", known.join("/"))
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub delivery_id: i64,
    pub sender_id: i64,
    pub receiver_phone_number: String,
    pub delivery_status: DeliveryStatus,
    pub product_image: Option<String>,
    pub pickup_address: String,
    pub pickup_gps: NullablePoint,
    pub dropoff_address: String,
    pub dropoff_gps: NullablePoint,
    pub rider_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for Delivery {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let pickup: Option<String> = row.try_get("pickup_gps")?;
        let dropoff: Option<String> = row.try_get("dropoff_gps")?;

        Ok(Self {
            delivery_id: row.try_get("delivery_id")?,
            sender_id: row.try_get("sender_id")?,
            receiver_phone_number: row.try_get("receiver_phone_number")?,
            delivery_status: row.try_get("delivery_status")?,
            product_image: row.try_get("product_image")?,
            pickup_address: row.try_get("pickup_address")?,
            pickup_gps: decode_stored(pickup.as_deref()),
            dropoff_address: row.try_get("dropoff_address")?,
            dropoff_gps: decode_stored(dropoff.as_deref()),
            rider_id: row.try_get("rider_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub address: String,
    pub point: GeoPoint,
}

#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub sender_id: i64,
    pub receiver_phone_number: String,
    pub pickup: Stop,
    pub dropoff: Stop,
    pub product_image: Option<String>,
}
