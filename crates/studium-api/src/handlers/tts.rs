//! TTS voice listing and narration preview.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use studium_core::{TtsBackend, TtsVoice};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<String>,
    pub voices_info: Vec<TtsVoice>,
}

#[derive(Deserialize)]
pub struct NarrationQuery {
    pub text: String,
    pub voice: Option<String>,
}

/// `GET /tts/voices`
pub async fn list_voices(State(state): State<AppState>) -> Json<VoicesResponse> {
    let voices_info = state.selector.tts().voices();
    let voices = voices_info.iter().map(|v| v.id.clone()).collect();
    Json(VoicesResponse {
        voices,
        voices_info,
    })
}

/// `GET /generate/narration?text=&voice=` — one-shot synthesized WAV for
/// UI previews.
pub async fn narration(
    State(state): State<AppState>,
    Query(query): Query<NarrationQuery>,
) -> Result<Response, ApiError> {
    let text = query.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("text must not be empty"));
    }

    let voice = query
        .voice
        .unwrap_or_else(|| studium_core::voices::default_voice().to_string());
    let audio = state.selector.tts().synthesize(text, &voice).await?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], audio).into_response())
}
