//! Blob store abstraction.

use async_trait::async_trait;

/// Errors surfaced by a blob store backend.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reference does not belong to this store.
    #[error("Unrecognised blob reference: {0}")]
    ForeignRef(String),

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Blob backend error: {0}")]
    Backend(String),
}

/// Storage backend for image blobs.
///
/// `put` returns the public reference (URL) to persist on the owning entity;
/// `delete` takes that same reference.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        public: bool,
    ) -> Result<String, BlobError>;

    async fn delete(&self, url: &str) -> Result<(), BlobError>;
}
