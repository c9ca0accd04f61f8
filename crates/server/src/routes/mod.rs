use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use scene_core::generation::GenerationError;
use scene_core::geometry::footprint;
use scene_core::persistence::{commit_placement, commit_score, ObjectRepository, StoreError};
use scene_core::placement::{PlacedObject, PlacementState};
use scene_core::rotation::{deg_to_rad, normalize_degrees, rad_to_deg};
use scene_core::scoring::aggregate;
use serde_json::{json, Value};
use shared::{
    ChatRequest, ChatResponse, CreateObjectRequest, PlacementRecord, PlacementRequest,
    ScoreRequest, ScoreResult, StoredObject, ValidationError,
};
use thiserror::Error;

use crate::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::warn!("{self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Chat → generator → validated object. Failures still answer with a chat
/// message so the client can show the apology.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<ChatResponse>) {
    let lang = state.settings.language;
    match state.generation.request(&request.message, &request.history).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ChatResponse {
                text: outcome.summary(lang).to_string(),
                footprint: Some(footprint(&outcome.object.parts).as_array()),
                object: Some(outcome.object),
                diff: outcome.diff,
            }),
        ),
        Err(e) => {
            let status = match e {
                GenerationError::Failed(_) => StatusCode::BAD_GATEWAY,
                GenerationError::Invalid(_) => StatusCode::BAD_REQUEST,
            };
            tracing::error!("Chat failed: {e}");
            (
                status,
                Json(ChatResponse {
                    text: e.user_message(lang).to_string(),
                    object: None,
                    footprint: None,
                    diff: None,
                }),
            )
        }
    }
}

pub async fn create_object(
    State(state): State<AppState>,
    Json(request): Json<CreateObjectRequest>,
) -> Result<(StatusCode, Json<StoredObject>), ApiError> {
    request.object.validate()?;
    let name = request.name.unwrap_or_else(|| "Untitled".to_string());
    let stored = state.store.create(&name, request.object).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn get_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredObject>, ApiError> {
    Ok(Json(state.store.get(&id).await?))
}

/// Commit a placement; the yaw is snapped to a quarter turn and the box is
/// computed from the stored object.
pub async fn update_placement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PlacementRequest>,
) -> Result<Json<PlacementRecord>, ApiError> {
    if request.position.iter().any(|c| !c.is_finite()) {
        return Err(ValidationError::NonFiniteObject { field: "position" }.into());
    }
    let stored = state.store.get(&id).await?;

    let [x, y, z] = request.position;
    let placement = PlacementState {
        hover_cell: None,
        placed_object: Some(PlacedObject {
            object: stored.object,
            world_x: x,
            world_y: y,
            world_z: z,
        }),
        rotation_y: deg_to_rad(normalize_degrees(rad_to_deg(request.rotation[1]))),
    };

    match commit_placement(&*state.store, &id, &placement).await? {
        Some(record) => Ok(Json(record)),
        None => Err(StoreError::Backend("placement produced no record".into()).into()),
    }
}

/// Score the user's six views against the reference and store the result
pub async fn score_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResult>, ApiError> {
    // 404 before spending six comparator calls
    state.store.get(&id).await?;

    let result = aggregate(
        &*state.comparator,
        &request.user_views,
        &request.reference_views,
        state.settings.language,
    )
    .await;
    commit_score(&*state.store, &id, result.clone()).await?;
    Ok(Json(result))
}
