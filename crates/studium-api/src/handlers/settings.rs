//! Settings, runtime info, and model download handlers.

use std::convert::Infallible;
use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use studium_core::{AppSettings, RuntimeInfo, SettingsRepository, SettingsUpdate};
use studium_inference::Downloader;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: AppSettings,
    pub runtime_info: RuntimeInfo,
}

#[derive(Deserialize)]
pub struct DownloadModelRequest {
    pub provider: String,
    pub model_name: String,
    pub ollama_base_url: Option<String>,
}

/// `GET /settings`
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state.db.settings.get_or_create().await?;
    Ok(Json(SettingsResponse {
        settings,
        runtime_info: (*state.runtime).clone(),
    }))
}

/// `POST /settings`
pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if let Some(provider) = update.llm_provider.as_deref() {
        if !matches!(provider, "openai" | "ollama") {
            return Err(ApiError::bad_request(format!(
                "unknown llm_provider: {}",
                provider
            )));
        }
    }
    if let Some(provider) = update.embedding_provider.as_deref() {
        if !matches!(provider, "openai" | "huggingface") {
            return Err(ApiError::bad_request(format!(
                "unknown embedding_provider: {}",
                provider
            )));
        }
    }

    let settings = state.db.settings.update(update).await?;
    Ok(Json(SettingsResponse {
        settings,
        runtime_info: (*state.runtime).clone(),
    }))
}

/// `POST /settings/download-model`
///
/// Streams download progress as SSE. For `ollama` the provider's pull
/// stream is proxied; for `huggingface` the model is fetched locally with
/// coarse events. Cancellable via `POST /settings/cancel-download`.
pub async fn download_model(
    State(state): State<AppState>,
    Json(req): Json<DownloadModelRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let settings = state.db.settings.get_or_create().await?;
    let (tx, rx) = tokio::sync::mpsc::channel(32);
    let downloader = Downloader::new(state.download_cancel.clone());

    match req.provider.as_str() {
        "ollama" => {
            let base_url = req
                .ollama_base_url
                .unwrap_or(settings.ollama_base_url);
            let model = req.model_name;
            tokio::spawn(async move {
                let _ = downloader.ollama(&base_url, &model, tx).await;
            });
        }
        "huggingface" => {
            let model = req.model_name;
            tokio::spawn(async move {
                let _ = downloader.huggingface(&model, tx).await;
            });
        }
        other => {
            return Err(ApiError::bad_request(format!(
                "unknown download provider: {}",
                other
            )))
        }
    }

    let stream = ReceiverStream::new(rx)
        .filter_map(|event| Event::default().json_data(&event).ok().map(Ok));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("keepalive"),
    ))
}

/// `POST /settings/cancel-download`
pub async fn cancel_download(State(state): State<AppState>) -> StatusCode {
    state.download_cancel.store(true, Ordering::Relaxed);
    StatusCode::NO_CONTENT
}
