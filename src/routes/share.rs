use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, info};

use crate::models::{AppState, ShareResponse};
use crate::storage;
use crate::types::{ApiError, ApiResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/share/{file_id}", get(share_link))
        .with_state(state)
}

/// GET /share/{file_id} - resolve an identifier to a fresh access URL
async fn share_link(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<Json<ShareResponse>> {
    let storage_config = &state.config.storage;
    let prefix = storage::key_prefix(&storage_config.folder, &file_id);

    let keys = state
        .storage
        .list_keys(&prefix)
        .await
        .map_err(ApiError::Share)?;

    // Several matches only happen when identifiers share a prefix; whichever
    // key the backend lists first is used.
    let key = keys.into_iter().next().ok_or_else(|| {
        debug!(prefix = %prefix, "No object matches share prefix");
        ApiError::NotFound
    })?;

    info!(file_id = %file_id, key = %key, "Generating share link");

    let file_url = storage::access_url(state.storage.as_ref(), storage_config, &key)
        .await
        .map_err(ApiError::Share)?;

    Ok(Json(ShareResponse {
        file_url,
        is_permanent: storage_config.use_permanent_urls,
    }))
}
