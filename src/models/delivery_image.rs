use serde::Serialize;
use sqlx::FromRow;

/// A photo taken at some point of a delivery, with the status label shown at the time.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DeliveryImage {
    pub image_id: i64,
    pub delivery_id: i64,
    pub image_url: String,
    pub status: String,
    pub uploaded_at: String,
}
