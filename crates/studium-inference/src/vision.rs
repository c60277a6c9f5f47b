//! Vision backends for image captioning.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use studium_core::defaults::GEN_TIMEOUT_SECS;
use studium_core::{Message, Result, VisionBackend};

use crate::retry::{provider_error, with_backoff};

/// Caption prompt shared by both providers.
const CAPTION_PROMPT: &str = "Describe this image in extreme detail for an educational \
     retrieval system. Extract all text, explain diagrams, and summarize key concepts shown.";

/// Ollama-based vision backend (e.g. llava).
pub struct OllamaVisionBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaVisionBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[async_trait]
impl VisionBackend for OllamaVisionBackend {
    async fn describe_image(&self, image_data: &[u8], _mime_type: &str) -> Result<String> {
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: CAPTION_PROMPT.to_string(),
            images: vec![image_b64],
            stream: false,
        };

        let result = with_backoff("ollama_vision", || async {
            let response = self
                .client
                .post(format!("{}/api/generate", self.base_url))
                .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), &body, "Ollama vision"));
            }
            let parsed: OllamaGenerateResponse = response.json().await?;
            Ok(parsed)
        })
        .await?;

        Ok(result.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// OpenAI-compatible vision backend (chat completions with image parts).
pub struct OpenAIVisionBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAIVisionBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct VisionChatRequest {
    model: String,
    messages: Vec<VisionMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct VisionMessage {
    role: String,
    content: Vec<VisionContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VisionContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct VisionChatResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Deserialize)]
struct VisionChoice {
    message: Message,
}

#[async_trait]
impl VisionBackend for OpenAIVisionBackend {
    async fn describe_image(&self, image_data: &[u8], mime_type: &str) -> Result<String> {
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);
        let data_url = format!("data:{};base64,{}", mime_type, image_b64);

        let request = VisionChatRequest {
            model: self.model.clone(),
            messages: vec![VisionMessage {
                role: "user".to_string(),
                content: vec![
                    VisionContentPart::Text {
                        text: CAPTION_PROMPT.to_string(),
                    },
                    VisionContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: 1500,
        };

        let result = with_backoff("openai_vision", || async {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), &body, "Vision completions"));
            }
            let parsed: VisionChatResponse = response.json().await?;
            Ok(parsed)
        })
        .await?;

        Ok(result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn ollama_vision_returns_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "A mitochondrion diagram with labeled cristae."
            })))
            .mount(&server)
            .await;

        let backend = OllamaVisionBackend::new(server.uri(), "llava");
        let caption = backend.describe_image(b"fakepng", "image/png").await.unwrap();
        assert!(caption.contains("mitochondrion"));
        assert_eq!(backend.model_name(), "llava");
    }

    #[tokio::test]
    async fn openai_vision_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "A cell diagram."}}]
            })))
            .mount(&server)
            .await;

        let backend = OpenAIVisionBackend::new(server.uri(), "sk-test", "gpt-4o");
        let caption = backend.describe_image(b"fakejpg", "image/jpeg").await.unwrap();
        assert_eq!(caption, "A cell diagram.");
    }

    #[test]
    fn content_part_serializes_tagged() {
        let part = VisionContentPart::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/png;base64,xyz".to_string(),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/png;base64,xyz");
    }
}
