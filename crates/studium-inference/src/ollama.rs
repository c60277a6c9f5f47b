//! Ollama inference backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use studium_core::defaults::{EMBED_TIMEOUT_SECS, GEN_TIMEOUT_SECS, HEALTH_TIMEOUT_SECS};
use studium_core::{EmbeddingBackend, GenerationBackend, Message, Result, Vector};

use crate::retry::{provider_error, with_backoff};

/// Ollama inference backend for generation and embeddings.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    gen_model: String,
    embed_model: String,
    embed_dimension: usize,
}

impl OllamaBackend {
    /// Create a generation-only backend.
    pub fn new_generation(base_url: impl Into<String>, gen_model: impl Into<String>) -> Self {
        Self::new(base_url, gen_model, String::new(), 0)
    }

    /// Create an embedding-only backend.
    pub fn new_embedding(
        base_url: impl Into<String>,
        embed_model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self::new(base_url, String::new(), embed_model, dimension)
    }

    /// Create a backend with both capabilities configured.
    pub fn new(
        base_url: impl Into<String>,
        gen_model: impl Into<String>,
        embed_model: impl Into<String>,
        embed_dimension: usize,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            gen_model: gen_model.into(),
            embed_model: embed_model.into(),
            embed_dimension,
        }
    }

    /// Check the server is reachable.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Shared chat call; `json_format` switches on Ollama's JSON mode.
    async fn chat_internal(&self, messages: &[Message], json_format: bool) -> Result<String> {
        let request = ChatRequest {
            model: self.gen_model.clone(),
            messages: messages.to_vec(),
            stream: false,
            format: json_format.then(|| serde_json::json!("json")),
        };

        let response = with_backoff("ollama_chat", || async {
            let response = self
                .client
                .post(format!("{}/api/chat", self.base_url))
                .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), &body, "Ollama chat"));
            }
            let parsed: ChatResponse = response.json().await?;
            Ok(parsed)
        })
        .await?;

        Ok(response.message.content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    #[instrument(skip(self, messages), fields(subsystem = "inference", component = "ollama", op = "complete", model = %self.gen_model))]
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let start = Instant::now();
        let content = self.chat_internal(messages, false).await?;
        let elapsed = start.elapsed().as_millis() as u64;
        debug!(response_len = content.len(), duration_ms = elapsed, "Generation complete");
        if elapsed > 30_000 {
            warn!(duration_ms = elapsed, slow = true, "Slow generation operation");
        }
        Ok(content)
    }

    #[instrument(skip(self, messages), fields(subsystem = "inference", component = "ollama", op = "complete_json", model = %self.gen_model))]
    async fn complete_json(&self, messages: &[Message]) -> Result<String> {
        self.chat_internal(messages, true).await
    }

    fn model_name(&self) -> &str {
        &self.gen_model
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaBackend {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "ollama", op = "embed_texts", model = %self.embed_model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: self.embed_model.clone(),
            input: texts.to_vec(),
        };

        let result = with_backoff("ollama_embed", || async {
            let response = self
                .client
                .post(format!("{}/api/embed", self.base_url))
                .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), &body, "Ollama embed"));
            }
            let parsed: EmbeddingResponse = response.json().await?;
            Ok(parsed)
        })
        .await?;

        Ok(result.embeddings.into_iter().map(Vector::from).collect())
    }

    fn dimension(&self) -> usize {
        self.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.embed_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = OllamaBackend::new_generation("http://localhost:11434/", "llama3.1");
        assert_eq!(backend.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn complete_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "Light becomes chemical energy."}
            })))
            .mount(&server)
            .await;

        let backend = OllamaBackend::new_generation(server.uri(), "llama3.1");
        let answer = backend
            .complete(&[Message::user("What does photosynthesis do?")])
            .await
            .unwrap();
        assert_eq!(answer, "Light becomes chemical energy.");
    }

    #[tokio::test]
    async fn complete_json_sets_format_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"format": "json"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "{\"ok\":true}"}
            })))
            .mount(&server)
            .await;

        let backend = OllamaBackend::new_generation(server.uri(), "llama3.1");
        let raw = backend.complete_json(&[Message::user("json please")]).await.unwrap();
        assert_eq!(raw, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn embed_maps_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2], [0.3, 0.4]]
            })))
            .mount(&server)
            .await;

        let backend = OllamaBackend::new_embedding(server.uri(), "nomic-embed-text", 2);
        let vectors = backend
            .embed_texts(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(backend.dimension(), 2);
    }

    #[tokio::test]
    async fn embed_empty_input_is_noop() {
        let backend = OllamaBackend::new_embedding("http://localhost:1", "m", 2);
        assert!(backend.embed_texts(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_is_classified_and_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let backend = OllamaBackend::new_generation(server.uri(), "llama3.1");
        let err = backend.complete(&[Message::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("server"), "got: {}", err);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OllamaBackend::new_generation(server.uri(), "missing");
        let err = backend.complete(&[Message::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("not_found"), "got: {}", err);
    }
}
