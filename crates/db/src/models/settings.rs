use bistro_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// Payment gateway credentials, stored as flat columns on `settings`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentGateway {
    #[sqlx(rename = "payment_gateway_type")]
    #[serde(rename = "type")]
    pub kind: String,
    #[sqlx(rename = "payment_api_key")]
    pub api_key: String,
    #[sqlx(rename = "payment_secret_key")]
    pub secret_key: String,
}

/// The single row of the `settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Settings {
    pub restaurant_name: String,
    pub contact_phone: String,
    pub address: String,
    pub opening_hours: String,
    #[sqlx(flatten)]
    pub payment_gateway: PaymentGateway,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Settings as shown to anonymous callers: no gateway credentials.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSettings {
    pub restaurant_name: String,
    pub contact_phone: String,
    pub address: String,
    pub opening_hours: String,
    pub updated_at: Timestamp,
}

impl From<Settings> for PublicSettings {
    fn from(s: Settings) -> Self {
        Self {
            restaurant_name: s.restaurant_name,
            contact_phone: s.contact_phone,
            address: s.address,
            opening_hours: s.opening_hours,
            updated_at: s.updated_at,
        }
    }
}

/// Full replacement of the settings record.
#[derive(Debug, Clone)]
pub struct PutSettings {
    pub restaurant_name: String,
    pub contact_phone: String,
    pub address: String,
    pub opening_hours: String,
    pub payment_gateway_type: String,
    pub payment_api_key: String,
    pub payment_secret_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSettings {
    pub restaurant_name: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<String>,
    pub payment_gateway_type: Option<String>,
    pub payment_api_key: Option<String>,
    pub payment_secret_key: Option<String>,
}
