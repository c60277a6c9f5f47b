//! Workspace handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use studium_core::{
    AppSettings, Document, EffectiveConfig, SettingsRepository, Workspace, WorkspaceRepository,
};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

/// Workspace detail with documents and the effective provider fields.
#[derive(Serialize)]
pub struct WorkspaceDetail {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub documents: Vec<Document>,
    pub effective_llm_provider: String,
    pub effective_llm_model: String,
    pub effective_embedding_provider: String,
    pub effective_embedding_model: String,
}

impl WorkspaceDetail {
    pub fn build(workspace: Workspace, documents: Vec<Document>, settings: &AppSettings) -> Self {
        let cfg = EffectiveConfig::resolve(&workspace, settings);
        Self {
            workspace,
            documents,
            effective_llm_provider: cfg.llm_provider,
            effective_llm_model: cfg.llm_model,
            effective_embedding_provider: cfg.embedding_provider,
            effective_embedding_model: cfg.embedding_model,
        }
    }
}

/// `GET /workspaces`
pub async fn list_workspaces(
    State(state): State<AppState>,
) -> Result<Json<Vec<Workspace>>, ApiError> {
    Ok(Json(state.db.workspaces.list().await?))
}

/// `POST /workspaces`
pub async fn create_workspace(
    State(state): State<AppState>,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<Json<Workspace>, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("workspace name must not be empty"));
    }
    Ok(Json(state.db.workspaces.create(name).await?))
}

/// `GET /workspaces/{id}`
pub async fn get_workspace(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WorkspaceDetail>, ApiError> {
    let workspace = state.db.workspaces.get(id).await?;
    let documents = state.db.documents.list_for_workspace(id).await?;
    let settings = state.db.settings.get_or_create().await?;
    Ok(Json(WorkspaceDetail::build(workspace, documents, &settings)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn detail_reports_effective_fields() {
        let workspace = Workspace {
            id: 1,
            name: "bio".to_string(),
            llm_provider: Some("ollama".to_string()),
            llm_model: Some("qwen2.5:7b".to_string()),
            embedding_provider: None,
            embedding_model: None,
            created_at: Utc::now(),
        };
        let settings = AppSettings::default();
        let detail = WorkspaceDetail::build(workspace, vec![], &settings);
        assert_eq!(detail.effective_llm_provider, "ollama");
        assert_eq!(detail.effective_llm_model, "qwen2.5:7b");
        assert_eq!(detail.effective_embedding_provider, "openai");
    }
}
