//! In-memory blob store for tests and disk-free development runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use wbgen_core::error::AppError;
use wbgen_core::result::AppResult;
use wbgen_core::traits::storage::BlobStore;

/// Blob store that keeps objects in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
    public_base_url: String,
}

impl MemoryBlobStore {
    /// Create an empty store serving URLs under the given base.
    pub fn new(public_base_url: &str) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("blob lock").len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn put(&self, path: &str, data: Bytes) -> AppResult<String> {
        self.objects
            .lock()
            .expect("blob lock")
            .insert(path.trim_start_matches('/').to_string(), data);
        Ok(self.public_url(path))
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        self.objects
            .lock()
            .expect("blob lock")
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Object not found: {path}")))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self
            .objects
            .lock()
            .expect("blob lock")
            .contains_key(path.trim_start_matches('/')))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.objects
            .lock()
            .expect("blob lock")
            .remove(path.trim_start_matches('/'));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryBlobStore::new("http://test/assets");
        let url = store.put("a/b.png", Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(url, "http://test/assets/a/b.png");
        assert_eq!(store.get("a/b.png").await.unwrap(), Bytes::from_static(b"x"));
        assert_eq!(store.len(), 1);
    }
}
