//! # studium-jobs
//!
//! Background task worker for studium: ingestion and podcast synthesis.
//!
//! Tasks are claimed from the DB queue (`studium-db::tasks`); one task runs
//! at a time per worker process, so a single local embedder or TTS model is
//! never contended within a process. Multiple worker processes may poll the
//! same queue concurrently.

pub mod extract;
pub mod handler;
pub mod ingest;
pub mod synthesize;
pub mod worker;

pub use handler::{TaskContext, TaskHandler, TaskResult};
pub use ingest::IngestHandler;
pub use synthesize::SynthesizeHandler;
pub use worker::{TaskWorker, WorkerConfig, WorkerHandle};
