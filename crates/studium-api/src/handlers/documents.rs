//! Document upload, retrieval, deletion, and reprocessing.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};
use uuid::Uuid;

use studium_core::{
    sanitize_filename, validate_upload, CreateDocumentRequest, Document, DocumentRepository,
    DocumentStatus, TaskKind, TaskRepository, WorkspaceRepository,
};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /workspaces/{id}/upload`
///
/// Accepts multipart form data with a `file` field, stores the file under
/// the workspace's upload directory, creates a `pending` document, and
/// queues ingestion. Upload always succeeds if the file is accepted;
/// ingestion failures surface later via the document's status.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(workspace_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Document>, ApiError> {
    // 404 before accepting a body for a workspace that doesn't exist.
    state.db.workspaces.get(workspace_id).await?;

    let mut file_name: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(String::from);
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("read error: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let original_name =
        file_name.ok_or_else(|| ApiError::bad_request("missing file in multipart form"))?;
    let data = file_data.ok_or_else(|| ApiError::bad_request("missing file in multipart form"))?;
    let file_type = validate_upload(&original_name, &data)?;

    let sanitized = sanitize_filename(&original_name);
    let stored_name = format!("{}_{}", Uuid::new_v4().simple(), sanitized);
    let workspace_dir = state.upload_dir.join(workspace_id.to_string());
    tokio::fs::create_dir_all(&workspace_dir)
        .await
        .map_err(studium_core::Error::Io)?;
    let disk_path = workspace_dir.join(&stored_name);
    tokio::fs::write(&disk_path, &data)
        .await
        .map_err(studium_core::Error::Io)?;

    let document = state
        .db
        .documents
        .insert(CreateDocumentRequest {
            workspace_id,
            title: original_name,
            file_type,
            file_path: disk_path.to_string_lossy().into_owned(),
        })
        .await?;

    state
        .db
        .tasks
        .enqueue(TaskKind::Ingest, document.id, None)
        .await?;

    info!(document_id = document.id, workspace_id, "Document uploaded, ingestion queued");
    Ok(Json(document))
}

/// `GET /documents/{id}`
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.db.documents.get(id).await?))
}

/// `DELETE /documents/{id}`
///
/// Requests cancellation of any in-flight ingestion first, then deletes
/// the row (chunks cascade) and the uploaded file.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let document = state.db.documents.get(id).await?;

    let cancelled = state.db.tasks.request_cancel(TaskKind::Ingest, id).await?;
    if cancelled > 0 {
        info!(document_id = id, "Requested cancellation of in-flight ingestion");
    }

    state.db.documents.delete(id).await?;

    if let Err(e) = tokio::fs::remove_file(&document.file_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %document.file_path, error = %e, "Failed to delete uploaded file");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /documents/{id}/reprocess`
///
/// Restarts ingestion from the first phase. A no-op if a task for this
/// document is already pending or running.
pub async fn reprocess_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.documents.get(id).await?;
    let queued = state.db.tasks.enqueue(TaskKind::Ingest, id, None).await?;
    if queued.is_some() {
        state
            .db
            .documents
            .set_status(id, DocumentStatus::Pending)
            .await?;
    }
    Ok(StatusCode::ACCEPTED)
}
