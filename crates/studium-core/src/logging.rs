//! Structured logging field name constants for studium.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation tools can query by standardized names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values |
//! | TRACE | Per-item iteration (chunks, turns, search hits) |

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "jobs", "engine"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "retriever", "ollama", "pool", "worker", "synthesizer"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ingest", "embed_texts", "search", "claim_next"
pub const OPERATION: &str = "op";

/// Workspace being operated on.
pub const WORKSPACE_ID: &str = "workspace_id";

/// Document being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Task being processed.
pub const TASK_ID: &str = "task_id";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of chunks processed.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Number of results returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
