//! Static file serving for uploaded documents and synthesized audio.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /files/{workspace_id}/{filename}` — uploaded document bytes.
pub async fn serve_upload(
    State(state): State<AppState>,
    Path((workspace_id, filename)): Path<(i64, String)>,
) -> Result<Response, ApiError> {
    let path = safe_join(
        &state.upload_dir.join(workspace_id.to_string()),
        &filename,
    )?;
    serve(&path, guess_mime(&filename)).await
}

/// `GET /audio/{filename}` — synthesized audio bytes.
pub async fn serve_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = safe_join(&state.audio_dir, &filename)?;
    serve(&path, "audio/wav").await
}

/// Join a client-supplied filename onto a base directory, rejecting path
/// traversal.
fn safe_join(base: &FsPath, filename: &str) -> Result<PathBuf, ApiError> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ApiError::bad_request("invalid filename"));
    }
    Ok(base.join(filename))
}

async fn serve(path: &FsPath, content_type: &str) -> Result<Response, ApiError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("file not found"));
        }
        Err(e) => return Err(studium_core::Error::Io(e).into()),
    };
    Ok((
        [(header::CONTENT_TYPE, content_type.to_string())],
        bytes,
    )
        .into_response())
}

fn guess_mime(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(str::to_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_join_rejects_traversal() {
        let base = FsPath::new("/srv/uploads");
        assert!(safe_join(base, "../etc/passwd").is_err());
        assert!(safe_join(base, "a/b.pdf").is_err());
        assert!(safe_join(base, "ok.pdf").is_ok());
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(guess_mime("a.pdf"), "application/pdf");
        assert_eq!(guess_mime("a.WAV"), "audio/wav");
        assert_eq!(guess_mime("a.bin"), "application/octet-stream");
    }
}
