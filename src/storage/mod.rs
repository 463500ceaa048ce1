//! Object storage layer
//!
//! The relay only needs four bucket operations: put an object, make it
//! publicly readable, list keys under a prefix, and presign a GET. They are
//! expressed as the [`ObjectStorage`] trait so the HTTP handlers never see
//! which backend is in use:
//! - [`S3Client`] talks to AWS S3 or any S3-compatible endpoint
//! - [`MemoryStorage`] keeps objects in process, for local runs and tests

pub mod memory;
pub mod s3_client;
pub mod signing;

pub use memory::MemoryStorage;
pub use s3_client::S3Client;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use thiserror::Error;

use crate::config::StorageConfig;

/// Validity window of signed URLs, in seconds (24 hours).
pub const SIGNED_URL_TTL_SECS: u32 = 86_400;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<s3::error::S3Error> for StorageError {
    fn from(e: s3::error::S3Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// Result of trying to mark an object public-read.
///
/// Buckets with object ownership enforced reject per-object ACLs. That is an
/// expected configuration, not a failure: public access then has to come from
/// a bucket policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclOutcome {
    Applied,
    Unsupported { reason: String },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key`, private, with the given content type.
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    async fn put_public_read_acl(&self, key: &str) -> Result<AclOutcome, StorageError>;

    /// Keys starting with `prefix`, in the order the backend lists them.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn presign_get(&self, key: &str, expiry_secs: u32) -> Result<String, StorageError>;
}

/// Build the storage key for a new upload: `{folder}/{file_id}-{file_name}`.
pub fn object_key(folder: &str, file_id: &str, file_name: &str) -> String {
    format!("{}/{}-{}", folder, file_id, file_name)
}

/// Prefix that every key created for `file_id` starts with.
pub fn key_prefix(folder: &str, file_id: &str) -> String {
    format!("{}/{}", folder, file_id)
}

/// Permanent, unsigned URL for a public object.
///
/// AWS uses the virtual-hosted form `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
/// A custom endpoint gets the path-style form `{endpoint}/{bucket}/{key}`.
pub fn permanent_url(config: &StorageConfig, key: &str) -> Result<String, StorageError> {
    let (base, leading) = match config.endpoint.as_deref() {
        Some(endpoint) => (endpoint.trim_end_matches('/').to_string(), Some(config.bucket.as_str())),
        None => (
            format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region),
            None,
        ),
    };

    let mut url = Url::parse(&base).map_err(|e| StorageError::Config(format!("invalid base URL {}: {}", base, e)))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| StorageError::Config(format!("base URL cannot carry a path: {}", base)))?;
        segments.pop_if_empty();
        if let Some(bucket) = leading {
            segments.push(bucket);
        }
        segments.extend(key.split('/'));
    }
    Ok(url.to_string())
}

/// Access URL for `key` in the configured mode: permanent or signed for 24 hours.
pub async fn access_url(
    storage: &dyn ObjectStorage,
    config: &StorageConfig,
    key: &str,
) -> Result<String, StorageError> {
    if config.use_permanent_urls {
        permanent_url(config, key)
    } else {
        storage.presign_get(key, SIGNED_URL_TTL_SECS).await
    }
}
