use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MultiItemOrder {
    pub order_id: i64,
    pub delivery_id: i64,
    pub item_description: String,
    pub item_image: Option<String>,
}
