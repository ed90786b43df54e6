use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cn_core::{Dataset, DatasetSink, Result};
use tokio::sync::RwLock;

/// Keeps saved datasets in memory, keyed by location.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<HashMap<String, Dataset>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, location: &str) -> Option<Dataset> {
        self.store.read().await.get(location).cloned()
    }

    pub async fn locations(&self) -> Vec<String> {
        let mut locations: Vec<_> = self.store.read().await.keys().cloned().collect();
        locations.sort();
        locations
    }
}

#[async_trait]
impl DatasetSink for MemoryStorage {
    async fn save(&self, dataset: &Dataset, location: &str) -> Result<()> {
        self.store
            .write()
            .await
            .insert(location.to_string(), dataset.clone());
        tracing::info!("💾 Dataset kept in memory as {}", location);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.get("out.csv").await.is_none());

        storage.save(&Dataset::default(), "out.csv").await.unwrap();
        storage.save(&Dataset::default(), "a.csv").await.unwrap();

        assert_eq!(storage.get("out.csv").await, Some(Dataset::default()));
        assert_eq!(storage.locations().await, vec!["a.csv", "out.csv"]);
    }
}
