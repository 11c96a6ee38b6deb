use sqlx::SqlitePool;

use crate::db::{write_error, Result};
use crate::models::multi_item_order::MultiItemOrder;

pub async fn create(
    pool: &SqlitePool,
    delivery_id: i64,
    item_description: &str,
    item_image: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO multi_item_orders (delivery_id, item_description, item_image)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(delivery_id)
    .bind(item_description)
    .bind(item_image)
    .execute(pool)
    .await
    .map_err(write_error("MultiItemOrder"))?;

    Ok(result.last_insert_rowid())
}

pub async fn list_by_delivery(pool: &SqlitePool, delivery_id: i64) -> Result<Vec<MultiItemOrder>> {
    let orders = sqlx::query_as::<_, MultiItemOrder>(
        r#"
        SELECT order_id, delivery_id, item_description, item_image
        FROM multi_item_orders
        WHERE delivery_id = ?
        ORDER BY order_id
        "#,
    )
    .bind(delivery_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::deliveries::{self, tests::new_delivery};
    use crate::db::test_support::{new_user, test_db};
    use crate::db::users;

    #[tokio::test]
    async fn lines_are_listed_per_delivery() {
        let db = test_db().await;
        let sender = users::create(db.pool(), &new_user("0811111111", "Sender")).await.unwrap();
        let first = deliveries::create(db.pool(), &new_delivery(sender)).await.unwrap();
        let second = deliveries::create(db.pool(), &new_delivery(sender)).await.unwrap();

        create(db.pool(), first, "rice 5kg", None).await.unwrap();
        create(db.pool(), first, "fish sauce", Some("uploads/sauce.jpg")).await.unwrap();
        create(db.pool(), second, "mangoes", None).await.unwrap();

        let lines = list_by_delivery(db.pool(), first).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].item_image.as_deref(), Some("uploads/sauce.jpg"));
    }
}
