//! Upload / replace / release orchestration over a [`BlobStore`].

use std::collections::HashSet;
use std::sync::Arc;

use super::store::BlobStore;
use super::upload::{blob_key, validate_image_upload, Upload};
use crate::catalog::Addon;
use crate::error::CoreError;

/// Couples blob storage calls to entity writes.
///
/// Upload failures are errors (the entity write must not proceed); delete
/// failures are logged and swallowed, leaving an orphan blob.
#[derive(Clone)]
pub struct AssetManager {
    store: Arc<dyn BlobStore>,
    max_upload_bytes: usize,
}

impl AssetManager {
    pub fn new(store: Arc<dyn BlobStore>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            max_upload_bytes,
        }
    }

    /// Validate an upload without storing it.
    pub fn validate(&self, upload: &Upload) -> Result<(), CoreError> {
        validate_image_upload(upload, self.max_upload_bytes)
    }

    /// Store a new blob under `prefix` and return its reference.
    pub async fn upload(&self, prefix: &str, upload: &Upload) -> Result<String, CoreError> {
        self.validate(upload)?;
        let key = blob_key(prefix, upload);
        self.store
            .put(&key, upload.bytes.clone(), &upload.content_type, true)
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "Blob upload failed");
                CoreError::Internal(format!("Image upload failed: {e}"))
            })
    }

    /// Upload the replacement for `current` without deleting `current` yet.
    ///
    /// Call [`Replacement::commit`] once the entity write succeeded, or
    /// [`Replacement::rollback`] if it failed.
    pub async fn stage(
        &self,
        prefix: &str,
        current: Option<&str>,
        upload: &Upload,
    ) -> Result<Replacement, CoreError> {
        let new_ref = self.upload(prefix, upload).await?;
        Ok(Replacement {
            new_ref,
            old_ref: current.filter(|r| !r.is_empty()).map(str::to_string),
        })
    }

    /// Upload a new blob, then delete the one it replaces.
    pub async fn replace(
        &self,
        prefix: &str,
        current: Option<&str>,
        upload: &Upload,
    ) -> Result<String, CoreError> {
        let replacement = self.stage(prefix, current, upload).await?;
        Ok(replacement.commit(self).await)
    }

    /// Delete a blob. Failures are logged, never returned.
    pub async fn release(&self, url: &str) {
        if url.is_empty() {
            return;
        }
        match self.store.delete(url).await {
            Ok(()) => tracing::debug!(url, "Blob released"),
            Err(e) => tracing::warn!(url, error = %e, "Blob delete failed, leaving orphan"),
        }
    }

    /// Delete every distinct reference in `urls` exactly once.
    pub async fn release_all<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        for url in urls {
            let url = url.as_ref();
            if seen.insert(url.to_string()) {
                self.release(url).await;
            }
        }
    }
}

/// A staged blob replacement: the new blob exists, the old one is still
/// referenced.
#[derive(Debug)]
#[must_use = "a staged replacement must be committed or rolled back"]
pub struct Replacement {
    new_ref: String,
    old_ref: Option<String>,
}

impl Replacement {
    pub fn new_ref(&self) -> &str {
        &self.new_ref
    }

    /// Set the reference being replaced, for callers that only learn it
    /// after uploading (e.g. once the entity row is locked).
    pub fn supersede(&mut self, current: &str) {
        self.old_ref = Some(current.to_string()).filter(|r| !r.is_empty());
    }

    /// The entity now points at the new blob: delete the old one.
    pub async fn commit(self, assets: &AssetManager) -> String {
        if let Some(old) = self.old_ref.as_deref() {
            if old != self.new_ref {
                assets.release(old).await;
            }
        }
        self.new_ref
    }

    /// The entity write failed: delete the new blob, keep the old one.
    pub async fn rollback(self, assets: &AssetManager) {
        assets.release(&self.new_ref).await;
    }
}

/// Blobs uploaded during one multi-step write, released together if the
/// write fails.
#[derive(Debug, Default)]
#[must_use = "staged uploads must be kept or rolled back"]
pub struct StagedUploads {
    urls: Vec<String>,
}

impl StagedUploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: String) {
        self.urls.push(url);
    }

    /// Keep the uploads; the entity write succeeded.
    pub fn keep(self) {}

    pub async fn rollback(self, assets: &AssetManager) {
        assets.release_all(&self.urls).await;
    }
}

/// Every blob exclusively owned by an item: its main image and each addon
/// image, without duplicates.
pub fn item_owned_refs(main_image: Option<&str>, addons: &[Addon]) -> Vec<String> {
    let mut seen = HashSet::new();
    main_image
        .into_iter()
        .chain(addons.iter().filter_map(|a| a.image_ref.as_deref()))
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

/// References held before a write that are no longer held after it.
pub fn released_refs(before: &[String], after: &[String]) -> Vec<String> {
    let kept: HashSet<&str> = after.iter().map(String::as_str).collect();
    before
        .iter()
        .filter(|url| !kept.contains(url.as_str()))
        .cloned()
        .collect()
}
