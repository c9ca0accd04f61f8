//! In-memory object store. Contents are lost on restart.

use std::collections::HashMap;

use scene_core::persistence::{ObjectRepository, StoreError, StoreResult};
use shared::{BuildingObject, ObjectId, PlacementRecord, ScoreResult, StoredObject};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify(&self, id: &str, f: impl FnOnce(&mut StoredObject)) -> StoreResult<()> {
        let mut objects = self.objects.write().await;
        let stored = objects.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(stored);
        Ok(())
    }
}

impl ObjectRepository for MemoryStore {
    async fn create(&self, name: &str, object: BuildingObject) -> StoreResult<StoredObject> {
        let stored = StoredObject {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            object,
            bounding_box: None,
            score: None,
        };
        self.objects.write().await.insert(stored.id.clone(), stored.clone());
        tracing::debug!("Stored object {} ({})", stored.id, stored.name);
        Ok(stored)
    }

    async fn get(&self, id: &str) -> StoreResult<StoredObject> {
        self.objects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_placement(&self, id: &str, record: PlacementRecord) -> StoreResult<()> {
        self.modify(id, |stored| {
            stored.object.position = Some(record.position);
            stored.object.rotation = Some(record.rotation);
            stored.bounding_box = Some(record.bounding_box);
        })
        .await
    }

    async fn save_score(&self, id: &str, score: ScoreResult) -> StoreResult<()> {
        self.modify(id, |stored| stored.score = Some(score)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let created = store.create("house", BuildingObject::canonical_default()).await.unwrap();
        assert!(!created.id.is_empty());

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.get("missing").await, Err(StoreError::NotFound("missing".into())));
    }

    #[tokio::test]
    async fn test_placement_and_score_updates() {
        let store = MemoryStore::new();
        let id = store.create("house", BuildingObject::canonical_default()).await.unwrap().id;

        let record = PlacementRecord {
            position: [2.0, 1.1, -2.0],
            rotation: [0.0, 0.0, 0.0],
            bounding_box: [4.0, 0.2, 4.0],
        };
        store.update_placement(&id, record).await.unwrap();
        let score = ScoreResult {
            views: BTreeMap::new(),
            overall_score: 80,
        };
        store.save_score(&id, score.clone()).await.unwrap();

        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored.object.position, Some([2.0, 1.1, -2.0]));
        assert_eq!(stored.bounding_box, Some([4.0, 0.2, 4.0]));
        assert_eq!(stored.score, Some(score));
    }

    #[tokio::test]
    async fn test_updates_to_missing_object_fail() {
        let store = MemoryStore::new();
        let score = ScoreResult {
            views: BTreeMap::new(),
            overall_score: 0,
        };
        assert!(matches!(store.save_score("nope", score).await, Err(StoreError::NotFound(_))));
    }
}
