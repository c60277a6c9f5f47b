//! OpenAI-compatible inference backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use studium_core::defaults::{self, EMBED_TIMEOUT_SECS, GEN_TIMEOUT_SECS};
use studium_core::{
    EmbeddingBackend, Error, GenerationBackend, Message, ProviderErrorKind, Result, Vector,
};

use crate::retry::{provider_error, with_backoff};

/// Configuration for an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model used for chat completions.
    pub gen_model: String,
    /// Model used for embeddings.
    pub embed_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: String::new(),
            gen_model: defaults::OPENAI_MODEL.to_string(),
            embed_model: defaults::OPENAI_EMBED_MODEL.to_string(),
            embed_dimension: 1536,
        }
    }
}

/// OpenAI-compatible inference backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    async fn chat_internal(&self, messages: &[Message], json_mode: bool) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: messages.to_vec(),
            temperature: if json_mode { 0.2 } else { 0.7 },
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = with_backoff("openai_chat", || async {
            let response = self
                .build_request("/chat/completions")
                .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), &body, "Chat completions"));
            }
            let parsed: ChatCompletionResponse = response.json().await?;
            Ok(parsed)
        })
        .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                Error::provider(
                    ProviderErrorKind::Server,
                    "chat completion response had no choices",
                )
            })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    #[instrument(skip(self, messages), fields(subsystem = "inference", component = "openai", op = "complete", model = %self.config.gen_model))]
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.chat_internal(messages, false).await
    }

    #[instrument(skip(self, messages), fields(subsystem = "inference", component = "openai", op = "complete_json", model = %self.config.gen_model))]
    async fn complete_json(&self, messages: &[Message]) -> Result<String> {
        self.chat_internal(messages, true).await
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "openai", op = "embed_texts", model = %self.config.embed_model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingsRequest {
            model: self.config.embed_model.clone(),
            input: texts.to_vec(),
        };

        let response = with_backoff("openai_embed", || async {
            let response = self
                .build_request("/embeddings")
                .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), &body, "Embeddings"));
            }
            let parsed: EmbeddingsResponse = response.json().await?;
            Ok(parsed)
        })
        .await?;

        // The API may return data out of order; restore input order.
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| Vector::from(d.embedding)).collect())
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(uri: &str) -> OpenAIBackend {
        OpenAIBackend::new(OpenAIConfig {
            base_url: uri.to_string(),
            api_key: "sk-test".to_string(),
            embed_dimension: 3,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn complete_sends_bearer_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}]
            })))
            .mount(&server)
            .await;

        let answer = backend(&server.uri())
            .complete(&[Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(answer, "hello");
    }

    #[tokio::test]
    async fn complete_json_requests_json_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(
                serde_json::json!({"response_format": {"type": "json_object"}}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{}"}}]
            })))
            .mount(&server)
            .await;

        let raw = backend(&server.uri())
            .complete_json(&[Message::user("json")])
            .await
            .unwrap();
        assert_eq!(raw, "{}");
    }

    #[tokio::test]
    async fn auth_failure_maps_to_auth_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend(&server.uri())
            .complete(&[Message::user("hi")])
            .await
            .unwrap_err();
        match err {
            Error::Provider { kind, .. } => assert_eq!(kind, ProviderErrorKind::Auth),
            other => panic!("expected provider error, got {}", other),
        }
    }

    #[tokio::test]
    async fn embeddings_preserve_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [1.0, 1.0, 1.0]},
                    {"index": 0, "embedding": [0.0, 0.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let vectors = backend(&server.uri())
            .embed_texts(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors[0].as_slice(), &[0.0, 0.0, 0.0]);
        assert_eq!(vectors[1].as_slice(), &[1.0, 1.0, 1.0]);
    }

    #[tokio::test]
    async fn rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.5, 0.5, 0.5]}]
            })))
            .mount(&server)
            .await;

        let vectors = backend(&server.uri())
            .embed_texts(&["a".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 1);
    }
}
