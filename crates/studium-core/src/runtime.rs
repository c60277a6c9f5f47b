//! Runtime hardware probe.
//!
//! Detects whether a CUDA device is present for local embedding inference.
//! The probe reads the NVIDIA driver's procfs entries; the `STUDIUM_DEVICE`
//! environment variable pins the result regardless of detection.

use std::path::Path;

use serde::Serialize;
use tracing::info;

/// Snapshot of the runtime environment, reported by `GET /settings`.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeInfo {
    /// "cpu" or "cuda".
    pub device: String,
    /// GPU name when a CUDA device was detected.
    pub cuda_device_name: Option<String>,
}

impl RuntimeInfo {
    /// Probe the host once at startup.
    pub fn probe() -> Self {
        if let Ok(device) = std::env::var(crate::defaults::ENV_DEVICE) {
            info!(device = %device, "Device pinned via environment");
            return Self {
                cuda_device_name: if device == "cuda" {
                    detect_cuda_name()
                } else {
                    None
                },
                device,
            };
        }

        match detect_cuda_name() {
            Some(name) => {
                info!(gpu = %name, "CUDA device detected");
                Self {
                    device: "cuda".to_string(),
                    cuda_device_name: Some(name),
                }
            }
            None => Self {
                device: "cpu".to_string(),
                cuda_device_name: None,
            },
        }
    }
}

/// Read the first GPU model name from the NVIDIA driver procfs, if present.
fn detect_cuda_name() -> Option<String> {
    let gpus_dir = Path::new("/proc/driver/nvidia/gpus");
    let entry = std::fs::read_dir(gpus_dir).ok()?.flatten().next()?;
    let info = std::fs::read_to_string(entry.path().join("information")).ok()?;
    info.lines()
        .find_map(|line| line.strip_prefix("Model:"))
        .map(|m| m.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_returns_known_device() {
        let info = RuntimeInfo::probe();
        assert!(info.device == "cpu" || info.device == "cuda");
    }

    #[test]
    fn runtime_info_serializes() {
        let info = RuntimeInfo {
            device: "cpu".to_string(),
            cuda_device_name: None,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["device"], "cpu");
        assert!(json["cuda_device_name"].is_null());
    }
}
