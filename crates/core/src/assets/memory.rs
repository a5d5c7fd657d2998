//! In-process blob store.
//!
//! Keeps blobs in memory and records every `put` / `delete` call, which makes
//! it usable both for local development without a storage directory and as a
//! call-counting stub in tests. Failures can be injected per operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::store::{BlobError, BlobStore};

const URL_SCHEME: &str = "memory://";

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `delete` fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// URLs returned by successful `put` calls, in call order.
    pub fn put_urls(&self) -> Vec<String> {
        lock(&self.puts).clone()
    }

    /// URLs passed to `delete`, in call order (including failed calls).
    pub fn deleted_urls(&self) -> Vec<String> {
        lock(&self.deletes).clone()
    }

    /// Number of `delete` calls made for `url`.
    pub fn delete_count(&self, url: &str) -> usize {
        lock(&self.deletes).iter().filter(|u| *u == url).count()
    }

    /// Whether a blob is currently stored under `url`.
    pub fn contains(&self, url: &str) -> bool {
        lock(&self.blobs).contains_key(url)
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        lock(&self.blobs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        _public: bool,
    ) -> Result<String, BlobError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(BlobError::Backend(format!("put rejected for {key}")));
        }
        let url = format!("{URL_SCHEME}{key}");
        lock(&self.blobs).insert(url.clone(), bytes);
        lock(&self.puts).push(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        lock(&self.deletes).push(url.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::Backend(format!("delete rejected for {url}")));
        }
        lock(&self.blobs).remove(url);
        Ok(())
    }
}
