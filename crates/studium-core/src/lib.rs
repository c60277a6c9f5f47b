//! # studium-core
//!
//! Core types, traits, and abstractions for the studium platform.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other studium crates depend on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod runtime;
pub mod traits;
pub mod voices;
pub mod wav;

// Re-export commonly used types at crate root
pub use config::EffectiveConfig;
pub use error::{Error, ProviderErrorKind, Result};
pub use events::{ProgressEvent, ProgressHub, ProgressKey, ProgressStage};
pub use file_safety::{sanitize_filename, validate_upload};
pub use models::*;
pub use runtime::RuntimeInfo;
pub use traits::*;
pub use voices::{voice_info, voices_with_info, VoiceInfo};
