//! Uploaded image validation and blob key naming.

use crate::error::CoreError;

/// Image file extensions accepted for upload.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "svg"];

/// Default per-file upload limit (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Key prefix for category images.
pub const PREFIX_CATEGORIES: &str = "categories";

/// Key prefix for item main images.
pub const PREFIX_ITEMS: &str = "items";

/// Key prefix for addon images.
pub const PREFIX_ADDONS: &str = "addons";

/// Key prefix for offer images.
pub const PREFIX_OFFERS: &str = "offers";

/// Key prefix for homepage slider images.
pub const PREFIX_SLIDERS: &str = "sliders";

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client file name. For addon images this doubles as the binding hint.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

/// Validate extension and size of an uploaded image.
pub fn validate_image_upload(upload: &Upload, max_bytes: usize) -> Result<(), CoreError> {
    let ext = upload.extension().unwrap_or_default();
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Only image files are allowed ({})",
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )));
    }
    if upload.bytes.is_empty() {
        return Err(CoreError::Validation(format!(
            "Uploaded file '{}' is empty",
            upload.file_name
        )));
    }
    if upload.bytes.len() > max_bytes {
        return Err(CoreError::Validation(format!(
            "Uploaded file '{}' exceeds the {max_bytes} byte limit",
            upload.file_name
        )));
    }
    Ok(())
}

/// Unique blob key for an upload: `<prefix>/<uuid v7>.<ext>`.
///
/// Keys never collide, so two entities never share one blob.
pub fn blob_key(prefix: &str, upload: &Upload) -> String {
    let ext = upload.extension().unwrap_or_else(|| "bin".to_string());
    format!("{prefix}/{}.{ext}", uuid::Uuid::now_v7())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, size: usize) -> Upload {
        Upload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn accepts_known_image_extensions() {
        assert!(validate_image_upload(&upload("pizza.PNG", 10), DEFAULT_MAX_UPLOAD_BYTES).is_ok());
        assert!(validate_image_upload(&upload("menu.jpeg", 10), DEFAULT_MAX_UPLOAD_BYTES).is_ok());
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(validate_image_upload(&upload("notes.pdf", 10), DEFAULT_MAX_UPLOAD_BYTES).is_err());
        assert!(validate_image_upload(&upload("noext", 10), DEFAULT_MAX_UPLOAD_BYTES).is_err());
    }

    #[test]
    fn rejects_oversized_and_empty_files() {
        assert!(validate_image_upload(&upload("a.png", 11), 10).is_err());
        assert!(validate_image_upload(&upload("a.png", 0), 10).is_err());
    }

    #[test]
    fn keys_are_prefixed_and_unique() {
        let u = upload("burger.webp", 1);
        let a = blob_key(PREFIX_ITEMS, &u);
        let b = blob_key(PREFIX_ITEMS, &u);
        assert!(a.starts_with("items/"));
        assert!(a.ends_with(".webp"));
        assert_ne!(a, b);
    }
}
