//! Repository for the `item_reviews` table.

use bistro_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::review::{CreateReview, Review, ReviewListing};

const COLUMNS: &str = "id, item_id, user_id, rating, comment, created_at, updated_at";

/// Listing projection joining reviewer and item.
const LISTING_SELECT: &str = "SELECT r.id, r.item_id, i.name AS item_name, \
        i.image_ref AS item_image_ref, i.average_rating AS item_average_rating, \
        i.review_count AS item_review_count, r.user_id, u.first_name, u.last_name, \
        u.profile_image, r.rating, r.comment, r.created_at \
    FROM item_reviews r \
    JOIN items i ON i.id = r.item_id \
    JOIN users u ON u.id = r.user_id";

/// Provides review persistence. Aggregate recomputation lives with the
/// caller, which runs these inside one transaction with the item row locked.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Insert a review. A second review by the same user for the same item
    /// violates `uq_item_reviews_item_user`.
    pub async fn create(conn: &mut PgConnection, input: &CreateReview) -> Result<Review, sqlx::Error> {
        let query = format!(
            "INSERT INTO item_reviews (item_id, user_id, rating, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(input.item_id)
            .bind(input.user_id)
            .bind(input.rating)
            .bind(&input.comment)
            .fetch_one(conn)
            .await
    }

    pub async fn exists_for_user(
        conn: &mut PgConnection,
        item_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM item_reviews WHERE item_id = $1 AND user_id = $2)",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Every rating currently recorded for an item.
    pub async fn ratings_for_item(
        conn: &mut PgConnection,
        item_id: DbId,
    ) -> Result<Vec<i16>, sqlx::Error> {
        let rows: Vec<(i16,)> = sqlx::query_as("SELECT rating FROM item_reviews WHERE item_id = $1")
            .bind(item_id)
            .fetch_all(conn)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// A page of one item's reviews, newest first.
    pub async fn list_for_item(
        pool: &PgPool,
        item_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReviewListing>, sqlx::Error> {
        let query = format!(
            "{LISTING_SELECT} WHERE r.item_id = $1 ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ReviewListing>(&query)
            .bind(item_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// A page of all reviews across items, newest first.
    pub async fn list_all(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReviewListing>, sqlx::Error> {
        let query =
            format!("{LISTING_SELECT} ORDER BY r.created_at DESC, r.id DESC LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, ReviewListing>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
