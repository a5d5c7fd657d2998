//! Order entity model and DTOs.

use bistro_core::order::{DeliveryType, OrderLine, OrderStatus, PaymentStatus};
use bistro_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::item::ItemWithCategory;

/// A row from the `orders` table.
///
/// `status`, `payment_status` and `delivery_type` hold the wire values of
/// the corresponding core enums; CHECK constraints keep them in range.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub user_id: DbId,
    pub line_items: Json<Vec<OrderLine>>,
    pub total_price: f64,
    pub status: String,
    pub payment_status: String,
    pub delivery_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An order with the current details of the items it references, for
/// display. Items deleted since ordering are omitted; the snapshot lines in
/// `line_items` stay authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<ItemWithCategory>,
}

/// DTO for inserting an order. Lines are already validated snapshots.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: DbId,
    pub line_items: Vec<OrderLine>,
    pub total_price: f64,
    pub delivery_type: DeliveryType,
}

/// DTO for updating an order. The status change is already validated
/// against the lifecycle.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrder {
    pub user_id: Option<DbId>,
    pub line_items: Option<Vec<OrderLine>>,
    pub total_price: Option<f64>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}
