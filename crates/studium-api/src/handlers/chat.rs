//! Chat handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use studium_core::{ChatRepository, ChatRole, WorkspaceRepository};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub workspace_id: i64,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Serialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

/// `POST /chat`
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let answer = state.chat.chat(req.workspace_id, message).await?;
    Ok(Json(ChatResponse { answer }))
}

/// `GET /chat/history/{workspace_id}`
pub async fn history(
    State(state): State<AppState>,
    Path(workspace_id): Path<i64>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    state.db.workspaces.get(workspace_id).await?;
    let messages = state.db.chat.history(workspace_id).await?;
    Ok(Json(
        messages
            .into_iter()
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content,
            })
            .collect(),
    ))
}
