//! In-memory storage backend.
//!
//! Holds blobs in a shared map. Used by tests and by local development where
//! no filesystem or S3 bucket is wanted; contents are lost on restart.

use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use sheetforge_core::StorageBackend;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, Bytes>>>,
    base_url: String,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        MemoryStorage {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            base_url: base_url.into(),
        }
    }

    /// Number of blobs currently held.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// All keys currently held, in no particular order.
    pub async fn keys(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        self.blobs
            .write()
            .await
            .insert(storage_key.to_string(), data);
        Ok(self.url_for(storage_key))
    }

    async fn get(&self, storage_key: &str) -> StorageResult<Bytes> {
        self.blobs
            .read()
            .await
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.blobs.write().await.remove(storage_key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<usize> {
        let mut blobs = self.blobs.write().await;
        let before = blobs.len();
        blobs.retain(|key, _| !key.starts_with(prefix));
        Ok(before - blobs.len())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.blobs.read().await.contains_key(storage_key))
    }

    fn url_for(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = MemoryStorage::new("mem://blobs");

        let data = Bytes::from_static(b"png");
        storage.put("a/b.png", data.clone(), "image/png").await.unwrap();
        assert_eq!(storage.get("a/b.png").await.unwrap(), data);

        storage.delete("a/b.png").await.unwrap();
        assert!(matches!(
            storage.get("a/b.png").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_prefix_counts_removed() {
        let storage = MemoryStorage::new("mem://blobs");
        for key in ["job/1.png", "job/2.png", "other/1.png"] {
            storage
                .put(key, Bytes::from_static(b"x"), "image/png")
                .await
                .unwrap();
        }

        assert_eq!(storage.delete_prefix("job/").await.unwrap(), 2);
        assert_eq!(storage.len().await, 1);
    }
}
