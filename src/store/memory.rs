//! In-memory model store.

use crate::core::{Error, Result, RoundId};
use crate::store::backend::ModelStore;
use crate::store::version::ModelVersion;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Store backed by an ordered in-process map.
///
/// Durable only for the process lifetime; intended for tests and embedded
/// single-process deployments.
pub struct MemoryModelStore {
    versions: RwLock<BTreeMap<RoundId, ModelVersion>>,
}

impl MemoryModelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            versions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored versions.
    pub async fn len(&self) -> usize {
        self.versions.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.versions.read().await.is_empty()
    }
}

impl Default for MemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn put(&self, version: ModelVersion) -> Result<()> {
        let mut versions = self.versions.write().await;
        if versions.contains_key(&version.round_id) {
            return Err(Error::DuplicateRound(version.round_id));
        }
        versions.insert(version.round_id, version);
        Ok(())
    }

    async fn get(&self, round_id: RoundId) -> Result<Option<ModelVersion>> {
        Ok(self.versions.read().await.get(&round_id).cloned())
    }

    async fn get_latest(&self) -> Result<Option<ModelVersion>> {
        Ok(self
            .versions
            .read()
            .await
            .values()
            .next_back()
            .cloned())
    }

    async fn round_ids(&self) -> Result<Vec<RoundId>> {
        Ok(self.versions.read().await.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{now, ModelKind};
    use std::collections::HashMap;

    fn version(round_id: RoundId, first: f32) -> ModelVersion {
        ModelVersion {
            round_id,
            model_kind: ModelKind::DemandForecast,
            aggregated_vector: vec![first, 0.0],
            aggregated_metrics: HashMap::new(),
            released_at: now(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryModelStore::new();
        store.put(version(1, 1.0)).await.unwrap();
        let out = store.get(1).await.unwrap().unwrap();
        assert_eq!(out.round_id, 1);
        assert!(store.get(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_put_fails_and_preserves_value() {
        let store = MemoryModelStore::new();
        store.put(version(1, 1.0)).await.unwrap();
        let err = store.put(version(1, 99.0)).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateRound(1)));
        // Stored value unchanged.
        let out = store.get(1).await.unwrap().unwrap();
        assert!((out.aggregated_vector[0] - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_get_latest_is_highest_round() {
        let store = MemoryModelStore::new();
        assert!(store.get_latest().await.unwrap().is_none());
        store.put(version(5, 5.0)).await.unwrap();
        store.put(version(2, 2.0)).await.unwrap();
        store.put(version(9, 9.0)).await.unwrap();
        assert_eq!(store.get_latest().await.unwrap().unwrap().round_id, 9);
    }

    #[tokio::test]
    async fn test_round_ids_ascending() {
        let store = MemoryModelStore::new();
        for id in [7, 1, 4] {
            store.put(version(id, id as f32)).await.unwrap();
        }
        assert_eq!(store.round_ids().await.unwrap(), vec![1, 4, 7]);
    }
}
