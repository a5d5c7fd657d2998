//! Repository for the `items` table.

use std::collections::HashMap;

use bistro_core::catalog::FEATURED_SLOT_LOCK_ID;
use bistro_core::review::RatingStats;
use bistro_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::category::CategorySummary;
use crate::models::item::{CreateItem, Item, ItemVariants, ItemWithCategory, UpdateItem};
use crate::repositories::CategoryRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, image_ref, price, category_id, \
    sizes, temperatures, addons, is_featured, is_deal, sell_count, item_type, \
    average_rating, review_count, created_at, updated_at";

/// Popularity ordering used by listings and search tiers.
const POPULARITY_ORDER: &str = "sell_count DESC, created_at DESC";

/// Provides CRUD, aggregate and search operations for items.
pub struct ItemRepo;

impl ItemRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert a new item inside the caller's transaction.
    ///
    /// The item is featured only when `input.featured` carries a reserved
    /// slot.
    pub async fn create(conn: &mut PgConnection, input: &CreateItem) -> Result<Item, sqlx::Error> {
        let query = format!(
            "INSERT INTO items
                (name, description, image_ref, price, category_id, sizes,
                 temperatures, addons, is_featured, is_deal, item_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.image_ref)
            .bind(input.price)
            .bind(input.category_id)
            .bind(Json(&input.sizes))
            .bind(Json(&input.temperatures))
            .bind(Json(&input.addons))
            .bind(input.featured.is_some())
            .bind(input.is_deal)
            .bind(&input.item_type)
            .fetch_one(conn)
            .await
    }

    /// Update an item inside the caller's transaction. Only non-`None`
    /// fields are applied; the featured flag follows `input.featured`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateItem,
    ) -> Result<Option<Item>, sqlx::Error> {
        let query = format!(
            "UPDATE items SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                image_ref = COALESCE($4, image_ref),
                price = COALESCE($5, price),
                category_id = COALESCE($6, category_id),
                sizes = COALESCE($7, sizes),
                temperatures = COALESCE($8, temperatures),
                addons = COALESCE($9, addons),
                is_featured = COALESCE($10, is_featured),
                is_deal = COALESCE($11, is_deal),
                item_type = COALESCE($12, item_type)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.image_ref)
            .bind(input.price)
            .bind(input.category_id)
            .bind(input.sizes.as_ref().map(Json))
            .bind(input.temperatures.as_ref().map(Json))
            .bind(input.addons.as_ref().map(Json))
            .bind(input.featured.as_flag())
            .bind(input.is_deal)
            .bind(&input.item_type)
            .fetch_optional(conn)
            .await
    }

    /// Delete an item, returning the removed row so its blobs can be
    /// released. Its reviews cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Item>, sqlx::Error> {
        let query = format!("DELETE FROM items WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Take the featured-slot lock for the current transaction, then count
    /// featured items other than `exclude`.
    ///
    /// The lock is held until the transaction ends, so the count stays valid
    /// for a write made in the same transaction.
    pub async fn lock_featured_count(
        conn: &mut PgConnection,
        exclude: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(FEATURED_SLOT_LOCK_ID)
            .execute(&mut *conn)
            .await?;

        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM items \
             WHERE is_featured AND ($1::BIGINT IS NULL OR id <> $1)",
        )
        .bind(exclude)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.0)
    }

    /// Atomically add `quantity` to an item's sell count.
    ///
    /// Returns `false` if the item does not exist.
    pub async fn increment_sell_count(
        conn: &mut PgConnection,
        id: DbId,
        quantity: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE items SET sell_count = sell_count + $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Persist recomputed review aggregates.
    pub async fn set_rating_stats(
        conn: &mut PgConnection,
        id: DbId,
        stats: &RatingStats,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE items SET average_rating = $2, review_count = $3 WHERE id = $1")
            .bind(id)
            .bind(stats.average_rating)
            .bind(stats.review_count)
            .execute(conn)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Item>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items WHERE id = $1");
        sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load an item and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Item>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Items with the given ids, most popular first. Unknown ids are skipped.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Item>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM items WHERE id = ANY($1) ORDER BY {POPULARITY_ORDER}"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Number of existing items among `ids`. Each existing item counts once.
    pub async fn count_existing(pool: &PgPool, ids: &[DbId]) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Current variant lists for the given items, read inside the order
    /// transaction.
    pub async fn variants_for(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<ItemVariants>, sqlx::Error> {
        sqlx::query_as::<_, ItemVariants>(
            "SELECT id, sizes, temperatures FROM items WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(conn)
        .await
    }

    /// List items, newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Item>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM items ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_category(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Vec<Item>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM items WHERE category_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await
    }

    /// Featured items, capped at `limit`.
    pub async fn list_featured(pool: &PgPool, limit: i64) -> Result<Vec<Item>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM items WHERE is_featured ORDER BY updated_at DESC LIMIT $1"
        );
        sqlx::query_as::<_, Item>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Best sellers, ties broken by recency.
    pub async fn list_popular(pool: &PgPool, limit: i64) -> Result<Vec<Item>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items ORDER BY {POPULARITY_ORDER} LIMIT $1");
        sqlx::query_as::<_, Item>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn list_deals(pool: &PgPool) -> Result<Vec<Item>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM items WHERE is_deal ORDER BY {POPULARITY_ORDER}"
        );
        sqlx::query_as::<_, Item>(&query).fetch_all(pool).await
    }

    /// Pair each item with its category summary.
    ///
    /// Items whose category no longer exists get `category: None`.
    pub async fn with_categories(
        pool: &PgPool,
        items: Vec<Item>,
    ) -> Result<Vec<ItemWithCategory>, sqlx::Error> {
        let mut ids: Vec<DbId> = items.iter().map(|i| i.category_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let summaries: HashMap<DbId, CategorySummary> = CategoryRepo::summaries(pool, &ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(items
            .into_iter()
            .map(|item| {
                let category = summaries.get(&item.category_id).cloned();
                ItemWithCategory { item, category }
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Items whose name or description equals `query` exactly.
    pub async fn search_exact(
        pool: &PgPool,
        query: &str,
        category_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<Item>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM items
             WHERE (name = $1 OR description = $1)
               AND ($2::BIGINT IS NULL OR category_id = $2)
             ORDER BY {POPULARITY_ORDER}
             LIMIT $3"
        );
        sqlx::query_as::<_, Item>(&sql)
            .bind(query)
            .bind(category_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Items whose name or description matches `pattern` case-insensitively,
    /// skipping `exclude`.
    pub async fn search_partial(
        pool: &PgPool,
        pattern: &str,
        category_id: Option<DbId>,
        exclude: &[DbId],
        limit: i64,
    ) -> Result<Vec<Item>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM items
             WHERE (name ~* $1 OR description ~* $1)
               AND ($2::BIGINT IS NULL OR category_id = $2)
               AND NOT (id = ANY($3))
             ORDER BY {POPULARITY_ORDER}
             LIMIT $4"
        );
        sqlx::query_as::<_, Item>(&sql)
            .bind(pattern)
            .bind(category_id)
            .bind(exclude)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
