//! Repository for the `categories` table.

use bistro_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::category::{Category, CategorySummary, CreateCategory, UpdateCategory};

const COLUMNS: &str = "id, name, image_ref, created_at, updated_at";

/// Provides CRUD and search operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a category. A duplicate name violates `uq_categories_name`.
    pub async fn create(pool: &PgPool, input: &CreateCategory) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, image_ref) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(&input.name)
            .bind(&input.image_ref)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all categories, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Summaries for a set of category ids. Unknown ids are skipped.
    pub async fn summaries(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<CategorySummary>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, CategorySummary>(
            "SELECT id, name, image_ref FROM categories WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Fetch a category and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Update a category. Only non-`None` fields in `input` are applied.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET
                name = COALESCE($2, name),
                image_ref = COALESCE($3, image_ref)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.image_ref)
            .fetch_optional(conn)
            .await
    }

    /// Delete a category, returning the removed row so its image can be
    /// released. Items keep their (now dangling) `category_id`.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("DELETE FROM categories WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -- search ---------------------------------------------------------------

    /// Categories whose name equals `query` exactly (case-sensitive).
    pub async fn search_exact(
        pool: &PgPool,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM categories
             WHERE name = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Categories whose name matches `pattern` case-insensitively, skipping
    /// `exclude`.
    pub async fn search_partial(
        pool: &PgPool,
        pattern: &str,
        exclude: &[DbId],
        limit: i64,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM categories
             WHERE name ~* $1 AND NOT (id = ANY($2))
             ORDER BY created_at DESC, id DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(pattern)
            .bind(exclude)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
