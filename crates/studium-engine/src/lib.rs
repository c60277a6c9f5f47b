//! # studium-engine
//!
//! The retrieval-and-generation engine: workspace-scoped semantic search
//! with embedding-compatibility enforcement, memory-windowed chat, the
//! structured artifact generators, and podcast orchestration.

pub mod chat;
pub mod generate;
pub mod podcast;
pub mod retriever;
pub mod structured;

pub use chat::ChatEngine;
pub use generate::{ExistingArtifacts, Generator};
pub use podcast::PodcastService;
pub use retriever::Retriever;
