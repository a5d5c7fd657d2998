//! Filesystem-backed blob store.
//!
//! Blobs are written under `root/<key>` and exposed as
//! `<base_url>/<key>`; the API serves `root` as static files.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::store::{BlobError, BlobStore};

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under `root`, rejecting traversal.
    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Map a public URL back to its key.
    fn key_for<'a>(&self, url: &'a str) -> Result<&'a str, BlobError> {
        url.strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| BlobError::ForeignRef(url.to_string()))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    /// Every local blob is publicly served, so `public` has no effect.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        _public: bool,
    ) -> Result<String, BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(format!("{}/{key}", self.base_url))
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let key = self.key_for(url)?;
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
