// S3 File Relay - upload files over HTTP, hand back permanent or signed S3 URLs

pub mod config;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod storage;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

use std::sync::Arc;

use config::StorageProvider;
use storage::{MemoryStorage, ObjectStorage, S3Client, StorageError};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

/// Build the storage backend selected by `STORAGE_PROVIDER`.
pub fn create_storage(config: &Config) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    let storage: Arc<dyn ObjectStorage> = match config.storage.provider {
        StorageProvider::S3 => Arc::new(S3Client::new(&config.storage)?),
        StorageProvider::Memory => Arc::new(MemoryStorage::new(config.storage.bucket.clone())),
    };
    Ok(storage)
}
