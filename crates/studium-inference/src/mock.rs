//! Deterministic mock backends for engine and pipeline tests.

use std::sync::Mutex;

use async_trait::async_trait;

use studium_core::{
    EmbeddingBackend, GenerationBackend, Message, Result, TtsBackend, TtsVoice, Vector,
    VisionBackend,
};

/// Generation backend returning queued canned responses (last one repeats).
pub struct MockGenerationBackend {
    responses: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<Vec<Message>>>,
}

impl MockGenerationBackend {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn single(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    fn next(&self, messages: &[Message]) -> String {
        self.calls.lock().unwrap().push(messages.to_vec());
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses.first().cloned().unwrap_or_default()
        }
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        Ok(self.next(messages))
    }

    async fn complete_json(&self, messages: &[Message]) -> Result<String> {
        Ok(self.next(messages))
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

/// Embedding backend producing deterministic vectors derived from input
/// bytes, so identical texts embed identically.
pub struct MockEmbeddingBackend {
    dimension: usize,
}

impl MockEmbeddingBackend {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vector {
        let mut values = vec![0.0f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            values[i % self.dimension] += byte as f32 / 255.0;
        }
        let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt().max(1e-6);
        Vector::from(values.into_iter().map(|v| v / norm).collect::<Vec<_>>())
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

/// Vision backend returning a fixed caption.
pub struct MockVisionBackend {
    pub caption: String,
    pub fail: bool,
}

impl MockVisionBackend {
    pub fn new(caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            caption: String::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl VisionBackend for MockVisionBackend {
    async fn describe_image(&self, _image_data: &[u8], _mime_type: &str) -> Result<String> {
        if self.fail {
            return Err(studium_core::Error::provider(
                studium_core::ProviderErrorKind::Server,
                "mock vision failure",
            ));
        }
        Ok(self.caption.clone())
    }

    fn model_name(&self) -> &str {
        "mock-vision"
    }
}

/// TTS backend emitting tiny valid PCM WAV files.
pub struct MockTtsBackend {
    sample_rate: u32,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockTtsBackend {
    pub fn new() -> Self {
        Self {
            sample_rate: 24_000,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MockTtsBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtsBackend for MockTtsBackend {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice.to_string()));
        // 10 ms of silence per call.
        let frames = (self.sample_rate / 100) as usize;
        let audio = studium_core::wav::WavAudio {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            data: vec![0u8; frames * 2],
        };
        Ok(audio.encode())
    }

    fn voices(&self) -> Vec<TtsVoice> {
        studium_core::voices::voices_with_info()
    }

    fn model_name(&self) -> &str {
        "mock-tts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_generation_cycles_responses() {
        let backend = MockGenerationBackend::new(vec!["a".into(), "b".into()]);
        assert_eq!(backend.complete(&[Message::user("1")]).await.unwrap(), "a");
        assert_eq!(backend.complete(&[Message::user("2")]).await.unwrap(), "b");
        assert_eq!(backend.complete(&[Message::user("3")]).await.unwrap(), "b");
        assert_eq!(backend.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn mock_embeddings_are_deterministic_and_normalized() {
        let backend = MockEmbeddingBackend::new(8);
        let a = backend.embed_texts(&["hello".to_string()]).await.unwrap();
        let b = backend.embed_texts(&["hello".to_string()]).await.unwrap();
        assert_eq!(a[0].as_slice(), b[0].as_slice());

        let norm: f32 = a[0].as_slice().iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn mock_tts_produces_parseable_wav() {
        let backend = MockTtsBackend::new();
        let bytes = backend.synthesize("hi", "af_bella").await.unwrap();
        let audio = studium_core::wav::WavAudio::parse(&bytes).unwrap();
        assert_eq!(audio.sample_rate, 24_000);
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }
}
