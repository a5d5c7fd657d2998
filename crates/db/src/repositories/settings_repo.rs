//! Repository for the single-row `settings` table.

use sqlx::PgPool;

use crate::models::settings::{PutSettings, Settings, UpdateSettings};

const COLUMNS: &str = "restaurant_name, contact_phone, address, opening_hours, \
    payment_gateway_type, payment_api_key, payment_secret_key, created_at, updated_at";

pub struct SettingsRepo;

impl SettingsRepo {
    pub async fn find(pool: &PgPool) -> Result<Option<Settings>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE id = 1");
        sqlx::query_as::<_, Settings>(&query)
            .fetch_optional(pool)
            .await
    }

    /// Create the record, or overwrite every field of the existing one.
    pub async fn put(pool: &PgPool, input: &PutSettings) -> Result<Settings, sqlx::Error> {
        let query = format!(
            "INSERT INTO settings (id, restaurant_name, contact_phone, address, opening_hours,
                                   payment_gateway_type, payment_api_key, payment_secret_key)
             VALUES (1, $1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO UPDATE SET
                restaurant_name = EXCLUDED.restaurant_name,
                contact_phone = EXCLUDED.contact_phone,
                address = EXCLUDED.address,
                opening_hours = EXCLUDED.opening_hours,
                payment_gateway_type = EXCLUDED.payment_gateway_type,
                payment_api_key = EXCLUDED.payment_api_key,
                payment_secret_key = EXCLUDED.payment_secret_key
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Settings>(&query)
            .bind(&input.restaurant_name)
            .bind(&input.contact_phone)
            .bind(&input.address)
            .bind(&input.opening_hours)
            .bind(&input.payment_gateway_type)
            .bind(&input.payment_api_key)
            .bind(&input.payment_secret_key)
            .fetch_one(pool)
            .await
    }

    /// Partial update. Returns `None` when no settings exist yet.
    pub async fn update(
        pool: &PgPool,
        input: &UpdateSettings,
    ) -> Result<Option<Settings>, sqlx::Error> {
        let query = format!(
            "UPDATE settings SET
                restaurant_name = COALESCE($1, restaurant_name),
                contact_phone = COALESCE($2, contact_phone),
                address = COALESCE($3, address),
                opening_hours = COALESCE($4, opening_hours),
                payment_gateway_type = COALESCE($5, payment_gateway_type),
                payment_api_key = COALESCE($6, payment_api_key),
                payment_secret_key = COALESCE($7, payment_secret_key)
             WHERE id = 1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Settings>(&query)
            .bind(&input.restaurant_name)
            .bind(&input.contact_phone)
            .bind(&input.address)
            .bind(&input.opening_hours)
            .bind(&input.payment_gateway_type)
            .bind(&input.payment_api_key)
            .bind(&input.payment_secret_key)
            .fetch_optional(pool)
            .await
    }

    /// Remove the record. Returns `false` when there was nothing to remove.
    pub async fn delete(pool: &PgPool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM settings WHERE id = 1")
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
