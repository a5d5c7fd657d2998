use std::sync::Arc;

use bistro_core::assets::local::LocalBlobStore;
use bistro_core::assets::manager::AssetManager;
use bistro_core::assets::memory::MemoryBlobStore;
use bistro_core::assets::store::BlobStore;

use crate::config::{BlobBackend, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: bistro_db::DbPool,
    /// Server configuration (JWT settings are read by the auth extractors).
    pub config: Arc<ServerConfig>,
    /// Image upload / release coordinator.
    pub assets: AssetManager,
}

impl AppState {
    /// Build state with the blob store selected by `config.blob_backend`.
    pub fn new(pool: bistro_db::DbPool, config: ServerConfig) -> Self {
        let store: Arc<dyn BlobStore> = match config.blob_backend {
            BlobBackend::Local => Arc::new(LocalBlobStore::new(
                config.blob_root.clone(),
                config.blob_public_base_url.clone(),
            )),
            BlobBackend::Memory => Arc::new(MemoryBlobStore::new()),
        };
        Self::with_store(pool, config, store)
    }

    /// Build state around an explicit blob store.
    pub fn with_store(
        pool: bistro_db::DbPool,
        config: ServerConfig,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        let assets = AssetManager::new(store, config.max_upload_bytes);
        Self {
            pool,
            config: Arc::new(config),
            assets,
        }
    }
}
