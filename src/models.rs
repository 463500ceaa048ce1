use std::sync::Arc;

use crate::config::Config;
use crate::storage::ObjectStorage;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            config: Arc::new(config),
            storage,
        }
    }
}

// API Request/Response types

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_url: String,
    pub file_id: String,
    pub is_permanent: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub file_url: String,
    pub is_permanent: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: String,
    pub bucket: String,
    pub permanent_urls: bool,
}
