//! Static File Serving
//!
//! Serves the browser upload page and its assets from the configured
//! directory for every path the API routes do not claim.

use axum::Router;
use std::path::Path;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Create router for serving static files
pub fn router(static_dir: &Path) -> Router {
    if static_dir.is_dir() {
        info!(path = %static_dir.display(), "Serving static files");
    } else {
        // Requests still resolve, just to 404.
        warn!(path = %static_dir.display(), "Static files directory not found");
    }

    let serve_dir = ServeDir::new(static_dir).append_index_html_on_directories(true);

    Router::new().fallback_service(serve_dir)
}
