//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `POST /upload` - Store a file, return its access URL
//! - `GET /share/{file_id}` - Resolve a file ID to an access URL
//! - `GET /api/health` - Health check
//! - `/` - Static file serving (upload page)

pub mod files;
pub mod health;
pub mod share;
pub mod static_files;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
///
/// API routes take precedence; anything else falls through to the static
/// directory. CORS and request tracing wrap every response.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let static_dir = state.config.server.static_dir.clone();

    let api_router = Router::new()
        .merge(files::router(state.clone()))
        .merge(share::router(state.clone()))
        .merge(health::router(state));

    Router::new()
        .merge(api_router)
        .merge(static_files::router(&static_dir))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::response::Response;
    use axum::Router;
    use serde::de::DeserializeOwned;

    use crate::config::test_config;
    use crate::models::AppState;
    use crate::storage::MemoryStorage;

    pub const BOUNDARY: &str = "relay-test-boundary";

    pub fn test_app(storage: MemoryStorage, use_permanent_urls: bool) -> Router {
        let state = AppState::new(test_config(use_permanent_urls), Arc::new(storage));
        super::create_router(state)
    }

    /// Encode `(field, file_name, content_type, data)` parts as multipart/form-data.
    pub fn multipart_body(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
                ),
            }
            if let Some(content_type) = content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
