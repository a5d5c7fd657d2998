//! Order lifecycle and line-item validation.
//!
//! `status` follows a fixed fulfillment path with a side exit to `returned`:
//!
//! ```text
//! pending -> accept -> preparing -> prepared -> out for delivery -> delivered
//!    \---------\-----------\-----------\---------------\-----> returned
//! ```
//!
//! `payment_status` is an independent two-state field; the engine enforces no
//! ordering between payment and fulfillment.

use serde::{Deserialize, Serialize};

use crate::catalog::{validate_price, Variant};
use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length of per-line special instructions.
pub const MAX_INSTRUCTIONS_LENGTH: usize = 1_000;

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "accept")]
    Accept,
    #[serde(rename = "preparing")]
    Preparing,
    #[serde(rename = "prepared")]
    Prepared,
    #[serde(rename = "out for delivery")]
    OutForDelivery,
    #[serde(rename = "delivered")]
    Delivered,
    #[serde(rename = "returned")]
    Returned,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        Self::Pending,
        Self::Accept,
        Self::Preparing,
        Self::Prepared,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Returned,
    ];

    /// Database / wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accept => "accept",
            Self::Preparing => "preparing",
            Self::Prepared => "prepared",
            Self::OutForDelivery => "out for delivery",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
        }
    }

    /// Parse from the database / wire value.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid order status '{value}'. Must be one of: {}",
                    Self::ALL.map(Self::as_str).join(", ")
                ))
            })
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Returned)
    }

    /// The next step on the fulfillment path, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Accept),
            Self::Accept => Some(Self::Preparing),
            Self::Preparing => Some(Self::Prepared),
            Self::Prepared => Some(Self::OutForDelivery),
            Self::OutForDelivery => Some(Self::Delivered),
            Self::Delivered | Self::Returned => None,
        }
    }

    /// Whether `self -> target` is a legal transition.
    ///
    /// Re-applying the current status is treated as a no-op and allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        if self == target {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        target == Self::Returned || self.next() == Some(target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            other => Err(CoreError::Validation(format!(
                "Invalid payment status '{other}'. Must be one of: unpaid, paid"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Delivery,
    Takeaway,
}

impl DeliveryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Takeaway => "takeaway",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "delivery" => Ok(Self::Delivery),
            "takeaway" => Ok(Self::Takeaway),
            other => Err(CoreError::Validation(format!(
                "Invalid delivery type '{other}'. Must be one of: delivery, takeaway"
            ))),
        }
    }
}

/// Validate a requested status change against the lifecycle.
pub fn validate_status_change(current: &str, target: &str) -> Result<OrderStatus, CoreError> {
    let from = OrderStatus::parse(current)?;
    let to = OrderStatus::parse(target)?;
    if !from.can_transition_to(to) {
        return Err(CoreError::Validation(format!(
            "Cannot move order from '{}' to '{}'",
            from.as_str(),
            to.as_str()
        )));
    }
    Ok(to)
}

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

fn default_quantity() -> i32 {
    1
}

/// An addon chosen for one order line, copied at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChosenAddon {
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

/// One order line. Stored as a snapshot inside the order row; it never
/// references mutable catalog fields beyond the item id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: DbId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub temperature: Option<String>,
    #[serde(default)]
    pub addons: Vec<ChosenAddon>,
    #[serde(default)]
    pub special_instructions: String,
}

impl OrderLine {
    /// Normalized copy for persistence: blank variant choices become `None`
    /// and instructions are trimmed.
    pub fn snapshot(&self) -> Self {
        Self {
            item_id: self.item_id,
            quantity: self.quantity,
            size: non_blank(self.size.as_deref()),
            temperature: non_blank(self.temperature.as_deref()),
            addons: self.addons.clone(),
            special_instructions: self.special_instructions.trim().to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate the shape of a line-item list (independent of the catalog).
pub fn validate_lines(lines: &[OrderLine]) -> Result<(), CoreError> {
    if lines.is_empty() {
        return Err(CoreError::Validation(
            "Order must contain at least one item".to_string(),
        ));
    }
    for (idx, line) in lines.iter().enumerate() {
        if line.quantity < 1 {
            return Err(CoreError::Validation(format!(
                "items[{idx}].quantity must be at least 1"
            )));
        }
        if line.special_instructions.chars().count() > MAX_INSTRUCTIONS_LENGTH {
            return Err(CoreError::Validation(format!(
                "items[{idx}].special_instructions must be at most {MAX_INSTRUCTIONS_LENGTH} characters"
            )));
        }
        for addon in &line.addons {
            validate_price(&format!("items[{idx}].addons.price"), addon.price)?;
        }
    }
    Ok(())
}

/// Validate that an order total is a positive, finite number.
pub fn validate_total_price(total_price: f64) -> Result<(), CoreError> {
    if !total_price.is_finite() || total_price <= 0.0 {
        return Err(CoreError::Validation(
            "total_price must be a positive number".to_string(),
        ));
    }
    Ok(())
}

/// Check a line's chosen size and temperature against the item's current
/// variants. Blank choices are always accepted.
pub fn validate_line_variants(
    line: &OrderLine,
    sizes: &[Variant],
    temperatures: &[Variant],
) -> Result<(), CoreError> {
    if let Some(size) = non_blank(line.size.as_deref()) {
        if !sizes.iter().any(|v| v.name == size) {
            return Err(CoreError::InvalidVariant(format!(
                "Invalid size '{size}' for item {}",
                line.item_id
            )));
        }
    }
    if let Some(temperature) = non_blank(line.temperature.as_deref()) {
        if !temperatures.iter().any(|v| v.name == temperature) {
            return Err(CoreError::InvalidVariant(format!(
                "Invalid temperature '{temperature}' for item {}",
                line.item_id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
