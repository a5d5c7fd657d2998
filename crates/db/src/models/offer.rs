//! Offer entity model and DTOs.

use bistro_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::item::Item;

/// A row from the `offers` table.
///
/// `item_ids` were validated when written; items deleted later are not
/// pruned from the list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Offer {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub image_ref: String,
    pub item_ids: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An offer with its still-existing items, for read endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct OfferWithItems {
    #[serde(flatten)]
    pub offer: Offer,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub struct CreateOffer {
    pub title: String,
    pub description: String,
    pub image_ref: String,
    pub item_ids: Vec<DbId>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOffer {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    pub item_ids: Option<Vec<DbId>>,
}
