//! Repository for the `sliders` table.

use bistro_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::slider::{CreateSlider, Slider, UpdateSlider};

const COLUMNS: &str = "id, text, image_ref, is_active, position, created_at, updated_at";

pub struct SliderRepo;

impl SliderRepo {
    pub async fn create(pool: &PgPool, input: &CreateSlider) -> Result<Slider, sqlx::Error> {
        let query = format!(
            "INSERT INTO sliders (text, image_ref, is_active, position)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Slider>(&query)
            .bind(&input.text)
            .bind(&input.image_ref)
            .bind(input.is_active)
            .bind(input.position)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Slider>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sliders WHERE id = $1");
        sqlx::query_as::<_, Slider>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active sliders in display order.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Slider>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sliders WHERE is_active ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, Slider>(&query).fetch_all(pool).await
    }

    /// Fetch a slider and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Slider>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sliders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Slider>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateSlider,
    ) -> Result<Option<Slider>, sqlx::Error> {
        let query = format!(
            "UPDATE sliders SET
                text = COALESCE($2, text),
                image_ref = COALESCE($3, image_ref),
                is_active = COALESCE($4, is_active),
                position = COALESCE($5, position)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Slider>(&query)
            .bind(id)
            .bind(&input.text)
            .bind(&input.image_ref)
            .bind(input.is_active)
            .bind(input.position)
            .fetch_optional(conn)
            .await
    }

    /// Delete a slider, returning the removed row so its image can be
    /// released.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Slider>, sqlx::Error> {
        let query = format!("DELETE FROM sliders WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Slider>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
