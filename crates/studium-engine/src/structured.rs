//! Structured generation: JSON-mode completion parsed into typed payloads.
//!
//! The model is called in JSON mode and its reply deserialized into the
//! target type, then domain-validated. Parse or validation failures retry
//! up to two more times before surfacing `Error::Generation`; provider
//! failures propagate immediately (the adapter already retried transient
//! kinds).

use serde::de::DeserializeOwned;
use tracing::warn;

use studium_core::defaults::STRUCTURED_GEN_ATTEMPTS;
use studium_core::{Error, GenerationBackend, Message, Result};

/// Generate a typed payload from the model.
pub async fn generate_structured<T, F>(
    backend: &dyn GenerationBackend,
    messages: &[Message],
    validate: F,
) -> Result<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Result<()>,
{
    let mut last_failure = String::new();

    for attempt in 1..=STRUCTURED_GEN_ATTEMPTS {
        let raw = backend.complete_json(messages).await?;
        let json_text = extract_json(&raw);

        match serde_json::from_str::<T>(json_text) {
            Ok(value) => match validate(&value) {
                Ok(()) => return Ok(value),
                Err(e) => {
                    last_failure = e.to_string();
                    warn!(attempt, error = %last_failure, "Generated payload failed validation");
                }
            },
            Err(e) => {
                last_failure = format!("invalid JSON: {}", e);
                warn!(attempt, error = %last_failure, "Generated payload failed to parse");
            }
        }
    }

    Err(Error::Generation(format!(
        "model output failed schema validation after {} attempts: {}",
        STRUCTURED_GEN_ATTEMPTS, last_failure
    )))
}

/// Strip markdown code fences some models wrap around JSON output.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use studium_inference::MockGenerationBackend;

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: i32,
    }

    #[tokio::test]
    async fn parses_valid_json_first_try() {
        let backend = MockGenerationBackend::single(r#"{"value": 7}"#);
        let payload: Payload =
            generate_structured(&backend, &[Message::user("go")], |_| Ok(())).await.unwrap();
        assert_eq!(payload.value, 7);
    }

    #[tokio::test]
    async fn strips_code_fences() {
        let backend = MockGenerationBackend::single("```json\n{\"value\": 3}\n```");
        let payload: Payload =
            generate_structured(&backend, &[Message::user("go")], |_| Ok(())).await.unwrap();
        assert_eq!(payload.value, 3);
    }

    #[tokio::test]
    async fn retries_on_parse_failure_then_succeeds() {
        let backend = MockGenerationBackend::new(vec![
            "not json".to_string(),
            r#"{"value": 1}"#.to_string(),
        ]);
        let payload: Payload =
            generate_structured(&backend, &[Message::user("go")], |_| Ok(())).await.unwrap();
        assert_eq!(payload.value, 1);
        assert_eq!(backend.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn retries_on_validation_failure() {
        let backend = MockGenerationBackend::new(vec![
            r#"{"value": -1}"#.to_string(),
            r#"{"value": 5}"#.to_string(),
        ]);
        let payload: Payload = generate_structured(&backend, &[Message::user("go")], |p| {
            if p.value < 0 {
                Err(Error::Validation("negative".into()))
            } else {
                Ok(())
            }
        })
        .await
        .unwrap();
        assert_eq!(payload.value, 5);
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let backend = MockGenerationBackend::single("still not json");
        let result: Result<Payload> =
            generate_structured(&backend, &[Message::user("go")], |_| Ok(())).await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(backend.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn extract_json_passthrough() {
        assert_eq!(extract_json(r#"{"a":1}"#), r#"{"a":1}"#);
        assert_eq!(extract_json("```json\n{}\n```"), "{}");
        assert_eq!(extract_json("```\n[]\n```"), "[]");
    }
}
