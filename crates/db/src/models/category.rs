//! Category entity model and DTOs.

use bistro_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub image_ref: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The part of a category embedded in item responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategorySummary {
    pub id: DbId,
    pub name: String,
    pub image_ref: String,
}

/// DTO for inserting a category. `image_ref` is an already-uploaded blob.
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub image_ref: String,
}

/// DTO for updating a category. `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub image_ref: Option<String>,
}
