//! Catalog value objects and invariants.
//!
//! Items carry three lists of named price modifiers (sizes, temperatures,
//! addons). They are owned value objects stored inside the item row; an
//! empty list is always valid. This module also owns the featured-item quota
//! and the offer membership check.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of items that may be featured at the same time.
pub const MAX_FEATURED_ITEMS: i64 = 4;

/// PostgreSQL advisory lock ID guarding the featured-item count.
/// Held for the lifetime of the transaction that reserves a slot.
pub const FEATURED_SLOT_LOCK_ID: i64 = 604_117_223;

/// Number of items returned by the "popular" listing.
pub const POPULAR_ITEMS_LIMIT: i64 = 5;

/// Maximum length for entity names and offer titles.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length for item and offer descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 5_000;

/// Item type: vegetarian.
pub const ITEM_TYPE_VEG: &str = "veg";

/// Item type: non-vegetarian.
pub const ITEM_TYPE_NON_VEG: &str = "non-veg";

/// All valid item type values.
pub const VALID_ITEM_TYPES: &[&str] = &[ITEM_TYPE_VEG, ITEM_TYPE_NON_VEG];

// ---------------------------------------------------------------------------
// Value objects
// ---------------------------------------------------------------------------

/// A named price modifier: one entry of an item's `sizes` or `temperatures`.
///
/// Names are not required to be unique within a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

/// An optional extra attached to an item, with its own optional image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    pub name: String,
    #[serde(default)]
    pub price: f64,
    /// Blob reference of the addon image, owned by this addon alone.
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Client-supplied hint matched against uploaded addon file names.
    #[serde(default)]
    pub image_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Field parsing and validation
// ---------------------------------------------------------------------------

/// Parse a multipart text field holding a JSON array.
///
/// A missing or blank field yields an empty list.
pub fn parse_json_array<T: DeserializeOwned>(field: &str, raw: &str) -> Result<Vec<T>, CoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| CoreError::Validation(format!("Invalid JSON format for {field}: {e}")))?;

    if !value.is_array() {
        return Err(CoreError::Validation(format!(
            "{field} must be a valid JSON array"
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| CoreError::Validation(format!("Invalid entry in {field}: {e}")))
}

/// Validate a required, length-limited text field.
pub fn validate_required_text(field: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

/// Validate that a price is a finite, non-negative number.
pub fn validate_price(field: &str, price: f64) -> Result<(), CoreError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

/// Validate that an item type string is one of the accepted values.
pub fn validate_item_type(item_type: &str) -> Result<(), CoreError> {
    if VALID_ITEM_TYPES.contains(&item_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid item type '{item_type}'. Must be one of: {}",
            VALID_ITEM_TYPES.join(", ")
        )))
    }
}

/// Validate a size or temperature list.
///
/// Every entry needs a non-empty name and a non-negative price. Duplicate
/// names are accepted.
pub fn validate_variants(field: &str, variants: &[Variant]) -> Result<(), CoreError> {
    for (idx, variant) in variants.iter().enumerate() {
        if variant.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "{field}[{idx}] requires a name"
            )));
        }
        validate_price(&format!("{field}[{idx}].price"), variant.price)?;
    }
    Ok(())
}

/// Validate an addon list.
///
/// Image hints must be unique so that each uploaded file binds to exactly
/// one addon.
pub fn validate_addons(addons: &[Addon]) -> Result<(), CoreError> {
    let mut hints = HashSet::new();
    for (idx, addon) in addons.iter().enumerate() {
        if addon.name.trim().is_empty() {
            return Err(CoreError::Validation(format!("addons[{idx}] requires a name")));
        }
        validate_price(&format!("addons[{idx}].price"), addon.price)?;
        if let Some(hint) = addon_hint(addon) {
            if !hints.insert(hint) {
                return Err(CoreError::Validation(format!(
                    "Duplicate addon image_name '{hint}'"
                )));
            }
        }
    }
    Ok(())
}

/// Non-empty image hint of an addon.
pub fn addon_hint(addon: &Addon) -> Option<&str> {
    addon
        .image_name
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

/// Whether any addon in the list carries the given image hint.
pub fn has_addon_with_hint(addons: &[Addon], hint: &str) -> bool {
    addons.iter().any(|a| addon_hint(a) == Some(hint))
}

/// Bind uploaded addon images (keyed by hint) to the addons whose hint matches.
///
/// Uploads whose hint matches no addon are left unattached.
pub fn attach_addon_images(addons: &mut [Addon], uploaded: &HashMap<String, String>) {
    for addon in addons.iter_mut() {
        let url = addon_hint(addon).and_then(|hint| uploaded.get(hint));
        if let Some(url) = url {
            addon.image_ref = Some(url.clone());
        }
    }
}

/// Drop addon image references the item did not already own.
///
/// Clients may echo back existing addon images when editing the addon list,
/// but may not point an addon at an arbitrary blob.
pub fn retain_owned_addon_images(addons: &mut [Addon], owned: &HashSet<String>) {
    for addon in addons.iter_mut() {
        if let Some(url) = addon.image_ref.as_ref() {
            if !owned.contains(url) {
                addon.image_ref = None;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Featured quota
// ---------------------------------------------------------------------------

/// Proof that a featured slot was available when it was reserved.
///
/// Only obtainable through [`FeaturedSlot::reserve`]; the repository layer
/// requires one to set `is_featured = true`, and callers reserve it while
/// holding [`FEATURED_SLOT_LOCK_ID`] in the same transaction as the write.
#[derive(Debug)]
pub struct FeaturedSlot {
    _private: (),
}

impl FeaturedSlot {
    /// Reserve a slot given the number of *other* items currently featured.
    pub fn reserve(featured_elsewhere: i64) -> Result<Self, CoreError> {
        if featured_elsewhere >= MAX_FEATURED_ITEMS {
            return Err(CoreError::QuotaExceeded(format!(
                "Maximum {MAX_FEATURED_ITEMS} featured items allowed"
            )));
        }
        Ok(Self { _private: () })
    }
}

/// Requested change to an item's featured flag during an update.
#[derive(Debug)]
pub enum FeaturedChange {
    Unchanged,
    Clear,
    Set(FeaturedSlot),
}

impl FeaturedChange {
    /// The value to persist, or `None` to keep the current flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Unchanged => None,
            Self::Clear => Some(false),
            Self::Set(_) => Some(true),
        }
    }
}

// ---------------------------------------------------------------------------
// Offer membership
// ---------------------------------------------------------------------------

/// Check that every requested item id resolved to an existing item.
///
/// `found` is the number of items matched by a set-membership query over
/// `requested`. The check does not identify which id was missing.
pub fn check_offer_membership(requested: &[DbId], found: i64) -> Result<(), CoreError> {
    if requested.is_empty() {
        return Ok(());
    }
    if found != requested.len() as i64 {
        return Err(CoreError::Validation(
            "One or more item IDs are invalid".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_validation {
        ($expr:expr) => {
            match $expr {
                Err(CoreError::Validation(_)) => {}
                other => panic!("expected validation error, got {other:?}"),
            }
        };
    }

    fn addon(name: &str, hint: Option<&str>, image: Option<&str>) -> Addon {
        Addon {
            name: name.to_string(),
            price: 1.5,
            image_ref: image.map(str::to_string),
            image_name: hint.map(str::to_string),
        }
    }

    // -- parse_json_array ----------------------------------------------------

    #[test]
    fn parse_blank_field_is_empty_list() {
        let sizes: Vec<Variant> = parse_json_array("sizes", "  ").unwrap();
        assert!(sizes.is_empty());
    }

    #[test]
    fn parse_valid_variant_array() {
        let sizes: Vec<Variant> =
            parse_json_array("sizes", r#"[{"name":"Large","price":2.5},{"name":"Small"}]"#)
                .unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[0].price, 2.5);
        assert_eq!(sizes[1].price, 0.0);
    }

    #[test]
    fn parse_rejects_non_array() {
        let result: Result<Vec<Variant>, _> = parse_json_array("sizes", r#"{"name":"Large"}"#);
        match result {
            Err(CoreError::Validation(msg)) => assert!(msg.contains("must be a valid JSON array")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let result: Result<Vec<DbId>, _> = parse_json_array("item_ids", "[1, 2");
        match result {
            Err(CoreError::Validation(msg)) => assert!(msg.contains("item_ids")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    // -- variants and addons -------------------------------------------------

    #[test]
    fn duplicate_variant_names_are_accepted() {
        let sizes = vec![
            Variant { name: "Large".into(), price: 2.0 },
            Variant { name: "Large".into(), price: 3.0 },
        ];
        assert!(validate_variants("sizes", &sizes).is_ok());
    }

    #[test]
    fn negative_variant_price_rejected() {
        let temps = vec![Variant { name: "Hot".into(), price: -1.0 }];
        assert_validation!(validate_variants("temperatures", &temps));
    }

    #[test]
    fn nan_price_rejected() {
        assert_validation!(validate_price("price", f64::NAN));
    }

    #[test]
    fn duplicate_addon_hints_rejected() {
        let addons = vec![
            addon("Cheese", Some("cheese.png"), None),
            addon("Extra cheese", Some("cheese.png"), None),
        ];
        assert_validation!(validate_addons(&addons));
    }

    #[test]
    fn addons_without_hints_are_valid() {
        let addons = vec![addon("Cheese", None, None), addon("Olives", Some(""), None)];
        assert!(validate_addons(&addons).is_ok());
    }

    #[test]
    fn item_type_values() {
        assert!(validate_item_type("veg").is_ok());
        assert!(validate_item_type("non-veg").is_ok());
        assert_validation!(validate_item_type("vegan"));
    }

    #[test]
    fn attach_binds_by_hint_not_position() {
        let mut addons = vec![
            addon("Cheese", Some("cheese.png"), None),
            addon("Bacon", Some("bacon.png"), None),
        ];
        let uploaded = HashMap::from([
            ("bacon.png".to_string(), "blob://addons/b".to_string()),
            ("unused.png".to_string(), "blob://addons/u".to_string()),
        ]);
        attach_addon_images(&mut addons, &uploaded);
        assert_eq!(addons[0].image_ref, None);
        assert_eq!(addons[1].image_ref.as_deref(), Some("blob://addons/b"));
    }

    #[test]
    fn retain_strips_foreign_images() {
        let mut addons = vec![
            addon("Cheese", None, Some("blob://mine")),
            addon("Bacon", None, Some("blob://someone-else")),
        ];
        let owned = HashSet::from(["blob://mine".to_string()]);
        retain_owned_addon_images(&mut addons, &owned);
        assert_eq!(addons[0].image_ref.as_deref(), Some("blob://mine"));
        assert_eq!(addons[1].image_ref, None);
    }

    // -- featured quota ------------------------------------------------------

    #[test]
    fn featured_slot_available_below_quota() {
        assert!(FeaturedSlot::reserve(0).is_ok());
        assert!(FeaturedSlot::reserve(MAX_FEATURED_ITEMS - 1).is_ok());
    }

    #[test]
    fn featured_slot_rejected_at_quota() {
        match FeaturedSlot::reserve(MAX_FEATURED_ITEMS) {
            Err(CoreError::QuotaExceeded(msg)) => assert!(msg.contains('4')),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn serialized_creates_never_exceed_quota() {
        let mut featured = 0;
        for _ in 0..10 {
            if FeaturedSlot::reserve(featured).is_ok() {
                featured += 1;
            }
        }
        assert_eq!(featured, MAX_FEATURED_ITEMS);
    }

    #[test]
    fn featured_change_flags() {
        assert_eq!(FeaturedChange::Unchanged.as_flag(), None);
        assert_eq!(FeaturedChange::Clear.as_flag(), Some(false));
        let slot = FeaturedSlot::reserve(1).unwrap();
        assert_eq!(FeaturedChange::Set(slot).as_flag(), Some(true));
    }

    // -- offer membership ----------------------------------------------------

    #[test]
    fn membership_requires_every_id() {
        assert!(check_offer_membership(&[1, 2, 3], 3).is_ok());
        assert_validation!(check_offer_membership(&[1, 2, 3, 4], 3));
    }

    #[test]
    fn membership_of_empty_set_is_valid() {
        assert!(check_offer_membership(&[], 0).is_ok());
    }
}
