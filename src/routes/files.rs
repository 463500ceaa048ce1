use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{AppState, UploadResponse};
use crate::storage::{self, AclOutcome};
use crate::types::{ApiError, ApiResult};

/// Multipart field the upload page and API clients send the file in.
const FILE_FIELD: &str = "file";

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// A file part, fully buffered.
#[derive(Debug)]
struct UploadedFile {
    file_name: String,
    content_type: String,
    data: Bytes,
}

/// POST /upload - store one file and return its access URL
async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    // A request that is not multipart at all carries no file either.
    let multipart = multipart.map_err(|rejection| {
        debug!("Upload request is not multipart: {}", rejection);
        ApiError::NoFile
    })?;
    let file = read_file_part(multipart).await?.ok_or(ApiError::NoFile)?;

    let storage_config = &state.config.storage;
    let file_id = Uuid::new_v4().to_string();
    let key = storage::object_key(&storage_config.folder, &file_id, &file.file_name);

    info!(
        file_id = %file_id,
        key = %key,
        size = file.data.len(),
        content_type = %file.content_type,
        "Uploading file"
    );

    state
        .storage
        .put_object(&key, file.data, &file.content_type)
        .await
        .map_err(ApiError::Upload)?;

    if storage_config.use_permanent_urls {
        apply_public_read(&state, &key).await;
    }

    let file_url = storage::access_url(state.storage.as_ref(), storage_config, &key)
        .await
        .map_err(ApiError::Upload)?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        file_url,
        file_id,
        is_permanent: storage_config.use_permanent_urls,
    }))
}

/// Try to make the object public. The upload already succeeded, so nothing
/// here fails the request: without ACLs a bucket policy has to grant read.
async fn apply_public_read(state: &AppState, key: &str) {
    match state.storage.put_public_read_acl(key).await {
        Ok(AclOutcome::Applied) => debug!(key = %key, "Object marked public-read"),
        Ok(AclOutcome::Unsupported { reason }) => info!(
            key = %key,
            reason = %reason,
            "ACLs not supported on this bucket, using bucket policy for public access"
        ),
        Err(e) => warn!(key = %key, "Failed to set public-read ACL: {}", e),
    }
}

/// Pull the single `file` part out of the form. Other fields are drained and ignored.
async fn read_file_part(mut multipart: Multipart) -> ApiResult<Option<UploadedFile>> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let is_file = field.name() == Some(FILE_FIELD)
            && field.file_name().is_some_and(|name| !name.is_empty());

        if !is_file {
            field.bytes().await.map_err(multipart_error)?;
            continue;
        }
        if file.is_some() {
            return Err(ApiError::MultipleFiles);
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = resolve_content_type(field.content_type(), &file_name);
        let data = field.bytes().await.map_err(multipart_error)?;

        file = Some(UploadedFile {
            file_name,
            content_type,
            data,
        });
    }

    Ok(file)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        debug!("Malformed multipart body: {}", e.body_text());
        ApiError::NoFile
    }
}

/// Declared content type if it parses, otherwise a guess from the file extension.
fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
    declared
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map(|m| m.to_string())
        .unwrap_or_else(|| {
            mime_guess::from_path(file_name)
                .first_or_octet_stream()
                .to_string()
        })
}
