use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Upload bodies larger than this are rejected before they reach storage.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    S3,
    Memory,
}

impl std::fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageProvider::S3 => write!(f, "s3"),
            StorageProvider::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(StorageProvider::S3),
            "memory" => Ok(StorageProvider::Memory),
            other => bail!("Unsupported storage provider: {}", other),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// S3-compatible endpoint; switches to path-style addressing when set.
    pub endpoint: Option<String>,
    /// Key prefix every upload is stored under.
    pub folder: String,
    pub use_permanent_urls: bool,
}

// Credentials stay out of the startup log.
impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("provider", &self.provider)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<set>"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<set>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<set>"))
            .field("endpoint", &self.endpoint)
            .field("folder", &self.folder)
            .field("use_permanent_urls", &self.use_permanent_urls)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                static_dir: env::var("STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("public")),
                max_upload_bytes: match env::var("MAX_UPLOAD_BYTES") {
                    Ok(v) => v.trim().parse()?,
                    Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
                },
            },
            storage: StorageConfig {
                provider: env::var("STORAGE_PROVIDER")
                    .unwrap_or_else(|_| "s3".to_string())
                    .parse()?,
                bucket: env::var("S3_BUCKET_NAME").unwrap_or_default(),
                region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: non_empty_var("AWS_ACCESS_KEY_ID"),
                secret_access_key: non_empty_var("AWS_SECRET_ACCESS_KEY"),
                session_token: non_empty_var("AWS_SESSION_TOKEN"),
                endpoint: non_empty_var("S3_ENDPOINT"),
                folder: non_empty_var("S3_FOLDER").unwrap_or_else(|| "uploads".to_string()),
                use_permanent_urls: env::var("USE_PERMANENT_URLS")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(false),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.provider == StorageProvider::S3 && self.storage.bucket.trim().is_empty() {
            bail!("S3_BUCKET_NAME must be set when STORAGE_PROVIDER is s3");
        }
        if self.server.max_upload_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES must be greater than zero");
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Only the literal `true` (any case) turns a flag on.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
pub(crate) fn test_config(use_permanent_urls: bool) -> Config {
    Config {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            static_dir: PathBuf::from("public"),
            max_upload_bytes: 1024 * 1024,
        },
        storage: StorageConfig {
            provider: StorageProvider::Memory,
            bucket: "relay-test".to_string(),
            region: "eu-west-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint: None,
            folder: "uploads".to_string(),
            use_permanent_urls,
        },
    }
}
