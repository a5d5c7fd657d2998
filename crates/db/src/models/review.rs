//! Item review model and DTOs.

use bistro_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `item_reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: DbId,
    pub item_id: DbId,
    pub user_id: DbId,
    pub rating: i16,
    pub comment: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A review joined with its reviewer and its item's current aggregates,
/// for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewListing {
    pub id: DbId,
    pub item_id: DbId,
    pub item_name: String,
    pub item_image_ref: String,
    pub item_average_rating: f64,
    pub item_review_count: i32,
    pub user_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    pub rating: i16,
    pub comment: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateReview {
    pub item_id: DbId,
    pub user_id: DbId,
    pub rating: i16,
    pub comment: String,
}
