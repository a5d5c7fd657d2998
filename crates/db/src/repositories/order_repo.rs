//! Repository for the `orders` table.

use bistro_core::order::OrderStatus;
use bistro_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::order::{CreateOrder, Order, UpdateOrder};

const COLUMNS: &str = "id, user_id, line_items, total_price, status, payment_status, \
    delivery_type, created_at, updated_at";

/// Provides CRUD operations for orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Insert an order inside the caller's transaction. New orders start
    /// `pending` and `unpaid`.
    pub async fn create(conn: &mut PgConnection, input: &CreateOrder) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (user_id, line_items, total_price, delivery_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(input.user_id)
            .bind(Json(&input.line_items))
            .bind(input.total_price)
            .bind(input.delivery_type.as_str())
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load an order and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List orders, newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(status.map(OrderStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update an order. Only non-`None` fields are applied.
    ///
    /// Line items are replaced wholesale; sell counts are not touched.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateOrder,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET
                user_id = COALESCE($2, user_id),
                line_items = COALESCE($3, line_items),
                total_price = COALESCE($4, total_price),
                status = COALESCE($5, status),
                payment_status = COALESCE($6, payment_status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(input.user_id)
            .bind(input.line_items.as_ref().map(Json))
            .bind(input.total_price)
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.payment_status.map(|s| s.as_str()))
            .fetch_optional(conn)
            .await
    }

    /// Delete an order. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any order by `user_id` contains a line for `item_id`.
    pub async fn user_has_ordered_item(
        conn: &mut PgConnection,
        user_id: DbId,
        item_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM orders
                WHERE user_id = $1
                  AND line_items @> jsonb_build_array(jsonb_build_object('item_id', $2::BIGINT))
            )",
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }
}
