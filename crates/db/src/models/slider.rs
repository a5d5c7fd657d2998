use bistro_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sliders` table: one home-screen banner.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Slider {
    pub id: DbId,
    pub text: String,
    pub image_ref: String,
    pub is_active: bool,
    pub position: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateSlider {
    pub text: String,
    pub image_ref: String,
    pub is_active: bool,
    pub position: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSlider {
    pub text: Option<String>,
    pub image_ref: Option<String>,
    pub is_active: Option<bool>,
    pub position: Option<i32>,
}
