use crate::domain::ports::{CatalogStore, Storage};
use crate::utils::error::{EstimatorError, PersistenceFailure, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local store for dry runs and tests. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_raw(&self, key: &str, blob: Vec<u8>) {
        self.blobs.lock().await.insert(key.to_string(), blob);
    }

    pub async fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_raw(id).await)
    }

    async fn put(&self, id: &str, blob: &[u8]) -> Result<()> {
        self.insert_raw(id, blob.to_vec()).await;
        Ok(())
    }
}

impl Storage for InMemoryCatalogStore {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.get_raw(path)
            .await
            .ok_or_else(|| EstimatorError::PersistenceError {
                id: path.to_string(),
                reason: PersistenceFailure::NotFound,
                message: "no such object".to_string(),
            })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.insert_raw(path, data.to_vec()).await;
        Ok(())
    }
}
