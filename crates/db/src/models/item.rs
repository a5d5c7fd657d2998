//! Item entity model and DTOs.

use bistro_core::catalog::{Addon, FeaturedChange, FeaturedSlot, Variant};
use bistro_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::category::CategorySummary;

/// A row from the `items` table.
///
/// `average_rating` and `review_count` are maintained by the review
/// repository; `sell_count` only ever grows through order placement.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Item {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub image_ref: String,
    pub price: f64,
    pub category_id: DbId,
    pub sizes: Json<Vec<Variant>>,
    pub temperatures: Json<Vec<Variant>>,
    pub addons: Json<Vec<Addon>>,
    pub is_featured: bool,
    pub is_deal: bool,
    pub sell_count: i64,
    pub item_type: Option<String>,
    pub average_rating: f64,
    pub review_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An item joined with its category summary, for read endpoints.
///
/// `category` is `None` when the soft reference no longer resolves.
#[derive(Debug, Clone, Serialize)]
pub struct ItemWithCategory {
    #[serde(flatten)]
    pub item: Item,
    pub category: Option<CategorySummary>,
}

/// Variant lists needed to validate an order line.
#[derive(Debug, Clone, FromRow)]
pub struct ItemVariants {
    pub id: DbId,
    pub sizes: Json<Vec<Variant>>,
    pub temperatures: Json<Vec<Variant>>,
}

/// DTO for inserting an item.
///
/// Featuring on create needs a [`FeaturedSlot`] reserved under the
/// featured-slot lock in the same transaction.
#[derive(Debug)]
pub struct CreateItem {
    pub name: String,
    pub description: String,
    pub image_ref: String,
    pub price: f64,
    pub category_id: DbId,
    pub sizes: Vec<Variant>,
    pub temperatures: Vec<Variant>,
    pub addons: Vec<Addon>,
    pub featured: Option<FeaturedSlot>,
    pub is_deal: bool,
    pub item_type: Option<String>,
}

/// DTO for updating an item. `None` fields keep their current value.
#[derive(Debug)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<DbId>,
    pub sizes: Option<Vec<Variant>>,
    pub temperatures: Option<Vec<Variant>>,
    pub addons: Option<Vec<Addon>>,
    pub featured: FeaturedChange,
    pub is_deal: Option<bool>,
    pub item_type: Option<String>,
}

impl Default for UpdateItem {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            image_ref: None,
            price: None,
            category_id: None,
            sizes: None,
            temperatures: None,
            addons: None,
            featured: FeaturedChange::Unchanged,
            is_deal: None,
            item_type: None,
        }
    }
}
