//! Buffered `multipart/form-data` parsing for catalog writes.
//!
//! Catalog forms mix text fields (some holding JSON arrays) with image
//! files. The whole form is read before any validation so that every check
//! runs before the first blob upload.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use bistro_core::assets::upload::Upload;
use bistro_core::catalog::parse_json_array;
use bistro_core::error::CoreError;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Field carrying the entity's main image.
pub const IMAGE_FIELD: &str = "image";

/// Repeatable field carrying addon images; the file name is the hint.
pub const ADDON_IMAGE_FIELD: &str = "addon_image";

/// A fully read multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub image: Option<Upload>,
    pub addon_images: Vec<Upload>,
}

impl MultipartForm {
    /// Drain `multipart` into memory.
    ///
    /// Unknown file fields are ignored. Empty file inputs (no name, no bytes)
    /// are treated as absent.
    pub async fn collect(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            match file_name {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    let upload = Upload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    };
                    match name.as_str() {
                        IMAGE_FIELD => form.image = Some(upload),
                        ADDON_IMAGE_FIELD => form.addon_images.push(upload),
                        _ => {}
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text value; blank values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required_text(&self, name: &str) -> Result<String, CoreError> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(|| CoreError::Validation(format!("{name} is required")))
    }

    /// Parse an optional scalar field.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, CoreError> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| CoreError::Validation(format!("{name} has an invalid value")))
            })
            .transpose()
    }

    /// Parse an optional boolean field (`true`/`false`/`1`/`0`).
    pub fn flag(&self, name: &str) -> Result<Option<bool>, CoreError> {
        self.text(name)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(CoreError::Validation(format!("{name} must be true or false"))),
            })
            .transpose()
    }

    /// Parse an optional field holding a JSON array.
    ///
    /// `None` when the field was not sent at all; a blank field is an empty
    /// list.
    pub fn json_array<T: DeserializeOwned>(&self, name: &str) -> Result<Option<Vec<T>>, CoreError> {
        self.fields
            .get(name)
            .map(|raw| parse_json_array(name, raw))
            .transpose()
    }

    /// Require the main image.
    pub fn required_image(&self) -> Result<&Upload, CoreError> {
        self.image
            .as_ref()
            .ok_or_else(|| CoreError::Validation("image is required".to_string()))
    }
}
