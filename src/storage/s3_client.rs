// S3 client backed by rust-s3, plus a hand-signed `PUT ?acl` call

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::Url;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;
use tracing::{debug, info};

use super::signing::{self, CanonicalRequest, SigningCredentials, EMPTY_PAYLOAD_SHA256};
use super::{AclOutcome, ObjectStorage, StorageError};
use crate::config::StorageConfig;

/// Where ACL requests for an object are addressed.
#[derive(Debug, Clone)]
enum Addressing {
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`
    VirtualHosted { host: String },
    /// `{endpoint}/{bucket}/{key}`
    PathStyle { base: Url },
}

/// S3 error codes meaning the bucket takes no ACLs at all, as opposed to
/// this request being refused.
const ACL_UNSUPPORTED_CODES: &[&str] = &["AccessControlListNotSupported", "NotImplemented"];

pub struct S3Client {
    bucket: Bucket,
    bucket_name: String,
    region: String,
    addressing: Addressing,
    http: reqwest::Client,
}

impl S3Client {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            None,
            config.session_token.as_deref(),
            None,
        )
        .map_err(|e| StorageError::Config(format!("failed to resolve credentials: {}", e)))?;

        let (region, addressing) = match config.endpoint.as_deref() {
            Some(endpoint) => {
                let base = Url::parse(endpoint)
                    .map_err(|e| StorageError::Config(format!("invalid S3_ENDPOINT {}: {}", endpoint, e)))?;
                let region = Region::Custom {
                    region: config.region.clone(),
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                };
                (region, Addressing::PathStyle { base })
            }
            None => {
                let region: Region = config
                    .region
                    .parse()
                    .map_err(|e| StorageError::Config(format!("invalid region {}: {}", config.region, e)))?;
                let host = format!("{}.s3.{}.amazonaws.com", config.bucket, config.region);
                (region, Addressing::VirtualHosted { host })
            }
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        if matches!(addressing, Addressing::PathStyle { .. }) {
            bucket = bucket.with_path_style();
        }

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "S3 client initialized"
        );

        Ok(Self {
            bucket,
            bucket_name: config.bucket.clone(),
            region: config.region.clone(),
            addressing,
            http: reqwest::Client::new(),
        })
    }

    /// Current credentials of the bucket, refreshed first if they have expired.
    async fn signing_credentials(&self) -> Result<SigningCredentials, StorageError> {
        self.bucket.credentials_refresh().await?;
        let credentials = self.bucket.credentials().await?;

        match (credentials.access_key, credentials.secret_key) {
            (Some(access_key), Some(secret_key)) => Ok(SigningCredentials {
                access_key,
                secret_key,
                session_token: credentials.session_token.or(credentials.security_token),
            }),
            _ => Err(StorageError::Config(
                "no credentials available to sign the ACL request".to_string(),
            )),
        }
    }

    /// Scheme, `Host` header value and encoded path for an object's ACL sub-resource.
    fn acl_target(&self, key: &str) -> Result<(String, String, String), StorageError> {
        let encoded_key = signing::encode_key_path(key);
        match &self.addressing {
            Addressing::VirtualHosted { host } => {
                Ok(("https".to_string(), host.clone(), format!("/{}", encoded_key)))
            }
            Addressing::PathStyle { base } => {
                let host = base
                    .host_str()
                    .ok_or_else(|| StorageError::Config(format!("S3_ENDPOINT has no host: {}", base)))?;
                let host = match base.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                let prefix = base.path().trim_end_matches('/');
                let path = format!(
                    "{}/{}/{}",
                    prefix,
                    signing::uri_encode(&self.bucket_name),
                    encoded_key
                );
                Ok((base.scheme().to_string(), host, path))
            }
        }
    }
}

/// `<Error>` document S3 returns on a failed request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: String,
}

fn error_code(body: &str) -> Option<String> {
    quick_xml::de::from_str::<ErrorBody>(body)
        .ok()
        .map(|error| error.code)
}

#[async_trait]
impl ObjectStorage for S3Client {
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        debug!(key = %key, size = data.len(), content_type = %content_type, "Putting object");

        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Status {
                operation: "PutObject",
                status,
                body: String::from_utf8_lossy(response.bytes()).into_owned(),
            });
        }
        Ok(())
    }

    async fn put_public_read_acl(&self, key: &str) -> Result<AclOutcome, StorageError> {
        let credentials = self.signing_credentials().await?;

        let (scheme, host, path) = self.acl_target(key)?;
        let now = Utc::now();
        let amz_date = signing::amz_date(now);

        let mut headers = vec![
            ("host".to_string(), host.clone()),
            ("x-amz-acl".to_string(), "public-read".to_string()),
            ("x-amz-content-sha256".to_string(), EMPTY_PAYLOAD_SHA256.to_string()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(token) = &credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let canonical = CanonicalRequest {
            method: "PUT",
            path: &path,
            query: "acl=",
            headers,
            payload_sha256: EMPTY_PAYLOAD_SHA256,
        };
        let authorization = signing::authorization_header(&credentials, &self.region, now, &canonical)?;

        let url = format!("{}://{}{}?acl", scheme, host, path);
        let mut request = self
            .http
            .put(&url)
            .header("x-amz-acl", "public-read")
            .header("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256)
            .header("x-amz-date", amz_date)
            .header("authorization", authorization);
        if let Some(token) = &credentials.session_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(AclOutcome::Applied);
        }

        let body = response.text().await.unwrap_or_default();
        match error_code(&body) {
            Some(code) if ACL_UNSUPPORTED_CODES.contains(&code.as_str()) => {
                Ok(AclOutcome::Unsupported {
                    reason: format!("{} ({})", code, status.as_u16()),
                })
            }
            _ => Err(StorageError::Status {
                operation: "PutObjectAcl",
                status: status.as_u16(),
                body,
            }),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let (page, status) = self
            .bucket
            .list_page(prefix.to_string(), None, None, None, None)
            .await?;
        debug!(prefix = %prefix, status, count = page.contents.len(), "Listed objects");

        Ok(page.contents.into_iter().map(|object| object.key).collect())
    }

    async fn presign_get(&self, key: &str, expiry_secs: u32) -> Result<String, StorageError> {
        Ok(self.bucket.presign_get(key, expiry_secs, None).await?)
    }
}
