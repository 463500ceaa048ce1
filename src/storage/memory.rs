//! In-process object storage
//!
//! Keeps objects in a sorted map so prefix listings come back in key order,
//! the way S3 lists them. Nothing survives a restart. Used for local runs
//! (`STORAGE_PROVIDER=memory`) and by the HTTP tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;

use super::signing::{amz_date, encode_key_path};
use super::{AclOutcome, ObjectStorage, StorageError};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub public_read: bool,
}

#[derive(Clone)]
pub struct MemoryStorage {
    bucket: String,
    acl_supported: bool,
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            acl_supported: true,
            objects: Arc::default(),
        }
    }

    /// Behave like a bucket with object ownership enforced: ACL calls are refused.
    pub fn without_acl_support(mut self) -> Self {
        self.acl_supported = false;
        self
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        let object = StoredObject {
            data,
            content_type: content_type.to_string(),
            public_read: false,
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn put_public_read_acl(&self, key: &str) -> Result<AclOutcome, StorageError> {
        if !self.acl_supported {
            return Ok(AclOutcome::Unsupported {
                reason: "AccessControlListNotSupported (400)".to_string(),
            });
        }

        let mut objects = self.objects.write().await;
        match objects.get_mut(key) {
            Some(object) => {
                object.public_read = true;
                Ok(AclOutcome::Applied)
            }
            None => Err(StorageError::Status {
                operation: "PutObjectAcl",
                status: 404,
                body: format!("NoSuchKey: {}", key),
            }),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn presign_get(&self, key: &str, expiry_secs: u32) -> Result<String, StorageError> {
        Ok(format!(
            "memory://{}/{}?X-Amz-Date={}&X-Amz-Expires={}",
            self.bucket,
            encode_key_path(key),
            amz_date(Utc::now()),
            expiry_secs
        ))
    }
}
