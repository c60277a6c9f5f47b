//! Model download progress streams.
//!
//! Ollama downloads proxy the `/api/pull` NDJSON stream, converting
//! completed/total byte counts into percentages. HuggingFace downloads run
//! the fastembed fetch on a blocking thread with coarse progress events.
//! Both poll a shared cancel flag between updates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use studium_core::defaults::SUPPORTED_DIMENSIONS;
use studium_core::Result;

use crate::embedding_models::{embedding_dimension, is_supported_dimension};
use crate::huggingface::HuggingFaceEmbeddingBackend;

/// One event of a download progress stream.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadEvent {
    pub status: String,
    pub progress: f32,
    pub message: String,
}

impl DownloadEvent {
    fn new(status: &str, progress: f32, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            progress: progress.clamp(0.0, 100.0),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("error", 0.0, message)
    }

    /// Whether this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        self.status == "completed" || self.status == "error"
    }
}

/// Line format of Ollama's pull stream.
#[derive(Deserialize)]
struct OllamaPullLine {
    #[serde(default)]
    status: String,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Streams model downloads as progress events.
pub struct Downloader {
    cancel: Arc<AtomicBool>,
}

impl Downloader {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self { cancel }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Pull a model through Ollama, forwarding its progress.
    pub async fn ollama(
        &self,
        base_url: &str,
        model_name: &str,
        tx: mpsc::Sender<DownloadEvent>,
    ) -> Result<()> {
        self.cancel.store(false, Ordering::Relaxed);
        info!(model = model_name, "Starting Ollama model pull");

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/api/pull", base_url.trim_end_matches('/')))
            .json(&serde_json::json!({"name": model_name, "stream": true}))
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                let _ = tx
                    .send(DownloadEvent::error(format!("Ollama returned {}", r.status())))
                    .await;
                return Ok(());
            }
            Err(e) => {
                let _ = tx.send(DownloadEvent::error(e.to_string())).await;
                return Ok(());
            }
        };

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(chunk) = stream.next().await {
            if self.cancelled() {
                let _ = tx.send(DownloadEvent::error("download cancelled")).await;
                return Ok(());
            }
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    let _ = tx.send(DownloadEvent::error(e.to_string())).await;
                    return Ok(());
                }
            };
            buffer.extend_from_slice(&chunk);

            // The pull stream is newline-delimited JSON.
            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                let Ok(parsed) = serde_json::from_slice::<OllamaPullLine>(&line) else {
                    continue;
                };
                if let Some(error) = parsed.error {
                    let _ = tx.send(DownloadEvent::error(error)).await;
                    return Ok(());
                }
                let event = match (parsed.completed, parsed.total) {
                    (Some(completed), Some(total)) if total > 0 => DownloadEvent::new(
                        "pulling",
                        (completed as f32 / total as f32) * 100.0,
                        parsed.status,
                    ),
                    _ if parsed.status == "success" => {
                        DownloadEvent::new("completed", 100.0, "pull complete")
                    }
                    _ => DownloadEvent::new("pulling", 0.0, parsed.status),
                };
                let terminal = event.is_terminal();
                if tx.send(event).await.is_err() || terminal {
                    return Ok(());
                }
            }
        }

        let _ = tx
            .send(DownloadEvent::new("completed", 100.0, "pull complete"))
            .await;
        Ok(())
    }

    /// Fetch a HuggingFace embedding model, verifying its dimension is one
    /// the chunk store supports.
    pub async fn huggingface(
        &self,
        model_name: &str,
        tx: mpsc::Sender<DownloadEvent>,
    ) -> Result<()> {
        self.cancel.store(false, Ordering::Relaxed);

        let dimension = match embedding_dimension("huggingface", model_name) {
            Ok(dim) => dim,
            Err(e) => {
                let _ = tx.send(DownloadEvent::error(e.to_string())).await;
                return Ok(());
            }
        };
        if !is_supported_dimension(dimension) {
            let _ = tx
                .send(DownloadEvent::error(format!(
                    "model {} has {} dimensions; supported: {:?}",
                    model_name, dimension, SUPPORTED_DIMENSIONS
                )))
                .await;
            return Ok(());
        }

        let _ = tx
            .send(DownloadEvent::new(
                "downloading",
                0.0,
                format!("fetching {}", model_name),
            ))
            .await;

        // fastembed fetches model files during initialization; the fetch is
        // not interruptible mid-file, so the cancel flag is honored at the
        // boundary.
        let result = HuggingFaceEmbeddingBackend::load_async(model_name).await;

        if self.cancelled() {
            let _ = tx.send(DownloadEvent::error("download cancelled")).await;
            return Ok(());
        }

        match result {
            Ok(_) => {
                let _ = tx
                    .send(DownloadEvent::new(
                        "completed",
                        100.0,
                        format!("{} ready ({} dims)", model_name, dimension),
                    ))
                    .await;
            }
            Err(e) => {
                warn!(model = model_name, error = %e, "Model download failed");
                let _ = tx.send(DownloadEvent::error(e.to_string())).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_clamps_progress() {
        let e = DownloadEvent::new("pulling", 140.0, "m");
        assert!((e.progress - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn terminal_statuses() {
        assert!(DownloadEvent::new("completed", 100.0, "").is_terminal());
        assert!(DownloadEvent::error("x").is_terminal());
        assert!(!DownloadEvent::new("pulling", 50.0, "").is_terminal());
    }

    #[test]
    fn pull_line_parses_progress_fields() {
        let line: OllamaPullLine = serde_json::from_str(
            r#"{"status":"pulling manifest","completed":512,"total":1024}"#,
        )
        .unwrap();
        assert_eq!(line.completed, Some(512));
        assert_eq!(line.total, Some(1024));
        assert!(line.error.is_none());
    }

    #[tokio::test]
    async fn huggingface_rejects_unknown_model_with_error_event() {
        let (tx, mut rx) = mpsc::channel(8);
        let downloader = Downloader::new(Arc::new(AtomicBool::new(false)));
        downloader.huggingface("org/unknown", tx).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.status, "error");
    }

    #[tokio::test]
    async fn ollama_unreachable_server_yields_error_event() {
        let (tx, mut rx) = mpsc::channel(8);
        let downloader = Downloader::new(Arc::new(AtomicBool::new(false)));
        downloader
            .ollama("http://127.0.0.1:1", "llama3.1", tx)
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.status, "error");
    }
}
