//! Repository for the `offers` table.

use bistro_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::offer::{CreateOffer, Offer, UpdateOffer};

const COLUMNS: &str = "id, title, description, image_ref, item_ids, created_at, updated_at";

/// Provides CRUD and search operations for offers.
///
/// Item membership is checked by the caller before any write.
pub struct OfferRepo;

impl OfferRepo {
    pub async fn create(pool: &PgPool, input: &CreateOffer) -> Result<Offer, sqlx::Error> {
        let query = format!(
            "INSERT INTO offers (title, description, image_ref, item_ids)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.image_ref)
            .bind(&input.item_ids)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM offers WHERE id = $1");
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List offers, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Offer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM offers ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Offer>(&query).fetch_all(pool).await
    }

    /// Fetch an offer and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM offers WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Update an offer. Only non-`None` fields in `input` are applied.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateOffer,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                image_ref = COALESCE($4, image_ref),
                item_ids = COALESCE($5, item_ids)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.image_ref)
            .bind(&input.item_ids)
            .fetch_optional(conn)
            .await
    }

    /// Delete an offer, returning the removed row so its image can be
    /// released.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!("DELETE FROM offers WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -- search ---------------------------------------------------------------

    /// Offers whose title or description equals `query` exactly.
    pub async fn search_exact(
        pool: &PgPool,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Offer>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM offers
             WHERE title = $1 OR description = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Offer>(&sql)
            .bind(query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Offers whose title or description matches `pattern`
    /// case-insensitively, skipping `exclude`.
    pub async fn search_partial(
        pool: &PgPool,
        pattern: &str,
        exclude: &[DbId],
        limit: i64,
    ) -> Result<Vec<Offer>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM offers
             WHERE (title ~* $1 OR description ~* $1) AND NOT (id = ANY($2))
             ORDER BY created_at DESC, id DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, Offer>(&sql)
            .bind(pattern)
            .bind(exclude)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
