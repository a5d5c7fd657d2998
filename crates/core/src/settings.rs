//! Restaurant-wide settings: contact details and payment gateway choice.

use serde::{Deserialize, Serialize};

use crate::catalog::{validate_required_text, MAX_NAME_LENGTH};
use crate::error::CoreError;

/// Upper bound for the free-text settings fields.
pub const MAX_SETTINGS_TEXT_LENGTH: usize = 500;

/// Which payment gateway the restaurant is configured for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentGatewayType {
    Stripe,
    Paypal,
    #[default]
    None,
}

impl PaymentGatewayType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Paypal => "paypal",
            Self::None => "none",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::Paypal),
            "none" => Ok(Self::None),
            other => Err(CoreError::Validation(format!(
                "Invalid payment gateway type '{other}'. Must be one of: stripe, paypal, none"
            ))),
        }
    }
}

/// Contact fields every settings record must carry.
#[derive(Debug, Clone, Copy)]
pub struct SettingsFields<'a> {
    pub restaurant_name: Option<&'a str>,
    pub contact_phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub opening_hours: Option<&'a str>,
}

impl SettingsFields<'_> {
    fn named(&self) -> [(&'static str, Option<&str>, usize); 4] {
        [
            ("restaurant_name", self.restaurant_name, MAX_NAME_LENGTH),
            ("contact_phone", self.contact_phone, MAX_NAME_LENGTH),
            ("address", self.address, MAX_SETTINGS_TEXT_LENGTH),
            ("opening_hours", self.opening_hours, MAX_SETTINGS_TEXT_LENGTH),
        ]
    }

    /// Creating or replacing the record: all four fields are required.
    pub fn validate_complete(&self) -> Result<(), CoreError> {
        for (field, value, max_len) in self.named() {
            validate_required_text(field, value.unwrap_or_default(), max_len)?;
        }
        Ok(())
    }

    /// Partial update: supplied fields must be non-blank, and at least one
    /// field (counting the gateway) must be present.
    pub fn validate_partial(&self, has_gateway: bool) -> Result<(), CoreError> {
        let mut any = has_gateway;
        for (field, value, max_len) in self.named() {
            if let Some(value) = value {
                validate_required_text(field, value, max_len)?;
                any = true;
            }
        }
        if !any {
            return Err(CoreError::Validation(
                "At least one field is required for update".into(),
            ));
        }
        Ok(())
    }
}
