//! Object-store trait and in-memory test implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::R2Client;
use crate::error::{StorageError, StorageResult};

/// The surface the orchestrator needs from object storage:
/// upload bytes into a folder and get back a durable public URL,
/// and fetch bytes from any URL (ours or a provider's).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `{folder}/{filename}` and return the public URL.
    async fn upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        folder: &str,
        filename: &str,
    ) -> StorageResult<String>;

    /// Download the contents behind a URL.
    async fn download(&self, url: &str) -> StorageResult<Vec<u8>>;
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        folder: &str,
        filename: &str,
    ) -> StorageResult<String> {
        let key = format!("{}/{}", folder.trim_matches('/'), filename);
        self.upload_bytes(data, &key, content_type).await
    }

    async fn download(&self, url: &str) -> StorageResult<Vec<u8>> {
        self.download_url(url).await
    }
}

/// In-memory object store for tests and local runs without a bucket.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object at an arbitrary URL (e.g. a fake provider output).
    pub async fn put(&self, url: impl Into<String>, data: Vec<u8>) {
        self.objects.lock().await.insert(url.into(), data);
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        data: Vec<u8>,
        _content_type: &str,
        folder: &str,
        filename: &str,
    ) -> StorageResult<String> {
        let url = format!("memory://{}/{}", folder.trim_matches('/'), filename);
        self.objects.lock().await.insert(url.clone(), data);
        Ok(url)
    }

    async fn download(&self, url: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| StorageError::not_found(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryObjectStore::new();
        let url = store
            .upload(b"hello".to_vec(), "audio/mpeg", "user1/job1/audio", "0.mp3")
            .await
            .unwrap();
        assert_eq!(url, "memory://user1/job1/audio/0.mp3");
        assert_eq!(store.download(&url).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_memory_store_missing_object() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            store.download("memory://nope").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
