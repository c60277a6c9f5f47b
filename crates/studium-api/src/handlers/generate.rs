//! Artifact generation handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use studium_engine::ExistingArtifacts;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub workspace_id: i64,
    pub topic: String,
}

#[derive(Deserialize)]
pub struct ExistingQuery {
    pub workspace_id: i64,
    pub topic: String,
}

/// `POST /generate/{lesson|flashcards|quiz|mindmap}`
pub async fn generate_artifact(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::bad_request("topic must not be empty"));
    }

    let artifact = match kind.as_str() {
        "lesson" => state.generator.lesson(req.workspace_id, topic).await?,
        "flashcards" => state.generator.flashcards(req.workspace_id, topic).await?,
        "quiz" => state.generator.quiz(req.workspace_id, topic).await?,
        "mindmap" => state.generator.mindmap(req.workspace_id, topic).await?,
        other => {
            return Err(ApiError::not_found(format!(
                "unknown artifact kind: {}",
                other
            )))
        }
    };

    Ok(Json(artifact.payload))
}

/// `GET /generate/existing?workspace_id=&topic=`
pub async fn get_existing(
    State(state): State<AppState>,
    Query(query): Query<ExistingQuery>,
) -> Result<Json<ExistingArtifacts>, ApiError> {
    let existing = state
        .generator
        .get_existing(query.workspace_id, query.topic.trim())
        .await?;
    Ok(Json(existing))
}
