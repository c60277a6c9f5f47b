//! Speech synthesis via a Kokoro-compatible HTTP server.
//!
//! The server exposes an OpenAI-style `/v1/audio/speech` endpoint and
//! returns WAV bytes. Unknown voices fall back to the catalog default.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use studium_core::defaults::{self, GEN_TIMEOUT_SECS};
use studium_core::voices;
use studium_core::{Result, TtsBackend, TtsVoice};

use crate::retry::{provider_error, with_backoff};

/// Kokoro-compatible TTS backend.
pub struct KokoroBackend {
    client: Client,
    base_url: String,
    model: String,
    speed: f32,
}

impl KokoroBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: "kokoro".to_string(),
            // Slightly faster than neutral reads more naturally for speech.
            speed: 1.1,
        }
    }

    /// Construct from `STUDIUM_TTS_BASE_URL`, falling back to the default.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_TTS_BASE_URL)
            .unwrap_or_else(|_| defaults::TTS_BASE_URL.to_string());
        Self::new(base_url)
    }
}

#[derive(Serialize)]
struct SpeechRequest {
    model: String,
    input: String,
    voice: String,
    response_format: String,
    speed: f32,
}

#[async_trait]
impl TtsBackend for KokoroBackend {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let voice = if voices::is_known_voice(voice) {
            voice.to_string()
        } else {
            warn!(voice, fallback = voices::default_voice(), "Unknown voice, falling back");
            voices::default_voice().to_string()
        };

        let request = SpeechRequest {
            model: self.model.clone(),
            input: text.to_string(),
            voice,
            response_format: "wav".to_string(),
            speed: self.speed,
        };

        let bytes = with_backoff("tts_synthesize", || async {
            let response = self
                .client
                .post(format!("{}/v1/audio/speech", self.base_url))
                .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), &body, "TTS"));
            }
            Ok(response.bytes().await?.to_vec())
        })
        .await?;

        Ok(bytes)
    }

    fn voices(&self) -> Vec<TtsVoice> {
        voices::voices_with_info()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn synthesize_posts_voice_and_returns_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(body_partial_json(serde_json::json!({
                "voice": "bm_lewis",
                "response_format": "wav"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFfake".to_vec()))
            .mount(&server)
            .await;

        let backend = KokoroBackend::new(server.uri());
        let audio = backend.synthesize("Hello there", "bm_lewis").await.unwrap();
        assert_eq!(audio, b"RIFFfake");
    }

    #[tokio::test]
    async fn unknown_voice_falls_back_to_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(body_partial_json(serde_json::json!({
                "voice": voices::default_voice()
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let backend = KokoroBackend::new(server.uri());
        let audio = backend.synthesize("Hi", "zz_nobody").await.unwrap();
        assert_eq!(audio, b"ok");
    }

    #[test]
    fn voices_come_from_catalog() {
        let backend = KokoroBackend::new("http://localhost:1");
        let voices = backend.voices();
        assert!(voices.iter().any(|v| v.id == "af_bella"));
    }
}
