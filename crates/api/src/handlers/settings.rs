//! Handlers for the restaurant `/settings` record.
//!
//! There is at most one settings record. Anonymous callers see the contact
//! fields only; gateway credentials are returned to admins alone.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bistro_core::settings::{PaymentGatewayType, SettingsFields};
use bistro_db::models::settings::{PublicSettings, PutSettings, Settings, UpdateSettings};
use bistro_db::repositories::SettingsRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// `payment_gateway` object accepted by both write endpoints.
#[derive(Debug, Deserialize)]
pub struct PaymentGatewayInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
}

/// Body for `POST /settings` and `PUT /settings`.
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub restaurant_name: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<String>,
    pub payment_gateway: Option<PaymentGatewayInput>,
}

impl SettingsRequest {
    fn fields(&self) -> SettingsFields<'_> {
        SettingsFields {
            restaurant_name: self.restaurant_name.as_deref(),
            contact_phone: self.contact_phone.as_deref(),
            address: self.address.as_deref(),
            opening_hours: self.opening_hours.as_deref(),
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn settings_not_found() -> AppError {
    AppError::NotFound("Settings not found".into())
}

/// POST /api/v1/settings
///
/// Creates the record, or replaces every field of the existing one. A
/// missing `payment_gateway` resets it to `none` with empty credentials.
pub async fn save(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppJson(input): AppJson<SettingsRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Settings>>)> {
    input.fields().validate_complete()?;
    let gateway = input.payment_gateway.unwrap_or(PaymentGatewayInput {
        kind: None,
        api_key: None,
        secret_key: None,
    });
    let gateway_type = match gateway.kind.as_deref() {
        Some(kind) => PaymentGatewayType::parse(kind)?,
        None => PaymentGatewayType::default(),
    };

    let settings = SettingsRepo::put(
        &state.pool,
        &PutSettings {
            restaurant_name: trimmed(input.restaurant_name).unwrap_or_default(),
            contact_phone: trimmed(input.contact_phone).unwrap_or_default(),
            address: trimmed(input.address).unwrap_or_default(),
            opening_hours: trimmed(input.opening_hours).unwrap_or_default(),
            payment_gateway_type: gateway_type.as_str().to_string(),
            payment_api_key: gateway.api_key.unwrap_or_default(),
            payment_secret_key: gateway.secret_key.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(
        user_id = admin.user_id,
        payment_gateway = %settings.payment_gateway.kind,
        "Settings saved"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: settings })))
}

/// GET /api/v1/settings
pub async fn get(State(state): State<AppState>) -> AppResult<Json<DataResponse<PublicSettings>>> {
    let settings = SettingsRepo::find(&state.pool)
        .await?
        .ok_or_else(settings_not_found)?;
    Ok(Json(DataResponse {
        data: settings.into(),
    }))
}

/// PUT /api/v1/settings
///
/// Partial update; at least one field must be supplied.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppJson(input): AppJson<SettingsRequest>,
) -> AppResult<Json<DataResponse<Settings>>> {
    input
        .fields()
        .validate_partial(input.payment_gateway.is_some())?;
    let gateway_type = input
        .payment_gateway
        .as_ref()
        .and_then(|g| g.kind.as_deref())
        .map(PaymentGatewayType::parse)
        .transpose()?;
    let (api_key, secret_key) = match input.payment_gateway {
        Some(g) => (g.api_key, g.secret_key),
        None => (None, None),
    };

    let changes = UpdateSettings {
        restaurant_name: trimmed(input.restaurant_name),
        contact_phone: trimmed(input.contact_phone),
        address: trimmed(input.address),
        opening_hours: trimmed(input.opening_hours),
        payment_gateway_type: gateway_type.map(|t| t.as_str().to_string()),
        payment_api_key: api_key,
        payment_secret_key: secret_key,
    };
    let settings = SettingsRepo::update(&state.pool, &changes)
        .await?
        .ok_or_else(settings_not_found)?;

    tracing::info!(user_id = admin.user_id, "Settings updated");
    Ok(Json(DataResponse { data: settings }))
}

/// DELETE /api/v1/settings
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    if !SettingsRepo::delete(&state.pool).await? {
        return Err(settings_not_found());
    }
    tracing::info!(user_id = admin.user_id, "Settings reset");
    Ok(StatusCode::NO_CONTENT)
}
