// HTTP-facing error type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ErrorResponse;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Only one file may be uploaded")]
    MultipleFiles,

    #[error("File too large")]
    PayloadTooLarge,

    #[error("Failed to upload file")]
    Upload(#[source] StorageError),

    #[error("File not found")]
    NotFound,

    #[error("Failed to generate share link")]
    Share(#[source] StorageError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::MultipleFiles => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upload(_) | ApiError::Share(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The storage cause is logged here and never sent to the client.
        match &self {
            ApiError::Upload(source) => tracing::error!("Error uploading file: {}", source),
            ApiError::Share(source) => tracing::error!("Error generating share link: {}", source),
            _ => tracing::debug!("Client error: {}", self),
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
