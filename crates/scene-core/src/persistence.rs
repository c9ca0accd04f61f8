//! Storage boundary for generated objects, their placement and score.

use std::future::Future;

use shared::{BuildingObject, ObjectId, PlacementRecord, ScoreResult, StoredObject};
use thiserror::Error;

use crate::placement::PlacementState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("object `{0}` not found")]
    NotFound(ObjectId),
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Where objects live between sessions
pub trait ObjectRepository {
    fn create(
        &self,
        name: &str,
        object: BuildingObject,
    ) -> impl Future<Output = StoreResult<StoredObject>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = StoreResult<StoredObject>> + Send;

    fn update_placement(
        &self,
        id: &str,
        record: PlacementRecord,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn save_score(
        &self,
        id: &str,
        score: ScoreResult,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Write the placed object's position, yaw and world-axis box.
/// Returns `Ok(None)` without touching storage when nothing is placed.
pub async fn commit_placement<R: ObjectRepository>(
    repo: &R,
    id: &str,
    state: &PlacementState,
) -> StoreResult<Option<PlacementRecord>> {
    let Some(record) = state.placement_record() else {
        tracing::debug!("Nothing placed for `{id}`, skipping commit");
        return Ok(None);
    };
    repo.update_placement(id, record.clone()).await?;
    tracing::info!(
        "Committed placement of `{id}` at {:?}, box {:?}",
        record.position,
        record.bounding_box
    );
    Ok(Some(record))
}

pub async fn commit_score<R: ObjectRepository>(
    repo: &R,
    id: &str,
    score: ScoreResult,
) -> StoreResult<()> {
    let overall = score.overall_score;
    repo.save_score(id, score).await?;
    tracing::info!("Saved score {overall} for `{id}`");
    Ok(())
}
