//! Task worker: claims queued tasks and dispatches them to handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use studium_core::defaults::{TASK_POLL_INTERVAL_MS, TASK_TIMEOUT_SECS};
use studium_core::{TaskKind, TaskRepository};
use studium_db::Database;

use crate::handler::{TaskContext, TaskHandler, TaskResult};

/// Configuration for the task worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval in milliseconds when the queue is empty.
    pub poll_interval_ms: u64,
    /// Whether to enable task processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: TASK_POLL_INTERVAL_MS,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `STUDIUM_WORKER_ENABLED` | `true` | Enable/disable task processing |
    /// | `STUDIUM_POLL_INTERVAL_MS` | `500` | Polling interval when queue is empty |
    pub fn from_env() -> Self {
        let enabled = std::env::var("STUDIUM_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        let poll_interval_ms = std::env::var("STUDIUM_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(TASK_POLL_INTERVAL_MS);
        Self {
            poll_interval_ms,
            enabled,
        }
    }

    /// Create a new config with custom poll interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Enable or disable task processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Task worker. One task runs at a time per worker process; concurrency
/// across processes comes from `FOR UPDATE SKIP LOCKED` claims.
pub struct TaskWorker {
    db: Database,
    config: WorkerConfig,
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl TaskWorker {
    pub fn new(db: Database, config: WorkerConfig) -> Self {
        Self {
            db,
            config,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a task kind.
    pub fn register_handler<H: TaskHandler + 'static>(mut self, handler: H) -> Self {
        let kind = handler.kind();
        self.handlers.insert(kind, Arc::new(handler));
        debug!(?kind, "Registered task handler");
        self
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });
        WorkerHandle { shutdown_tx }
    }

    /// Run the worker loop.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Task worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            "Task worker started"
        );

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let kinds: Vec<TaskKind> = self.handlers.keys().copied().collect();

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Task worker received shutdown signal");
                break;
            }

            let claimed = match self.db.tasks.claim_next(&kinds).await {
                Ok(task) => task,
                Err(e) => {
                    error!(error = %e, "Failed to claim task");
                    None
                }
            };

            match claimed {
                Some(task) => self.execute_task(task).await,
                None => {
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!("Task worker received shutdown signal");
                            break;
                        }
                        _ = sleep(poll_interval) => {}
                    }
                }
            }
        }

        info!("Task worker stopped");
    }

    /// Execute a single claimed task.
    async fn execute_task(&self, task: studium_core::Task) {
        let start = Instant::now();
        let task_id = task.id;
        let kind = task.kind;

        info!(task_id, ?kind, entity_id = task.entity_id, "Processing task");

        let Some(handler) = self.handlers.get(&kind).cloned() else {
            warn!(?kind, "No handler registered for task kind");
            let _ = self.db.tasks.fail(task_id, "no handler registered").await;
            return;
        };

        let tasks_repo = self.db.tasks.clone();
        let ctx = TaskContext::new(task).with_progress_callback(move |percent, message| {
            let repo = tasks_repo.clone();
            let message = message.map(String::from);
            tokio::spawn(async move {
                if let Err(e) = repo.update_progress(task_id, percent, message.as_deref()).await {
                    debug!(task_id, error = %e, "Failed to persist task progress");
                }
            });
        });

        let timeout = Duration::from_secs(TASK_TIMEOUT_SECS);
        let result = match tokio::time::timeout(timeout, handler.execute(ctx)).await {
            Ok(result) => result,
            Err(_) => TaskResult::Failed(format!("task exceeded timeout of {}s", TASK_TIMEOUT_SECS)),
        };

        match result {
            TaskResult::Success => {
                if let Err(e) = self.db.tasks.complete(task_id).await {
                    error!(task_id, error = %e, "Failed to mark task completed");
                } else {
                    info!(
                        task_id,
                        ?kind,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Task completed"
                    );
                }
            }
            TaskResult::Failed(error) => {
                if let Err(e) = self.db.tasks.fail(task_id, &error).await {
                    error!(task_id, error = %e, "Failed to mark task failed");
                } else {
                    warn!(
                        task_id,
                        ?kind,
                        %error,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Task failed"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.poll_interval_ms, TASK_POLL_INTERVAL_MS);
        assert!(config.enabled);
    }

    #[test]
    fn worker_config_builder() {
        let config = WorkerConfig::default()
            .with_poll_interval(1000)
            .with_enabled(false);
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(!config.enabled);
    }

    #[test]
    fn worker_config_chaining_order_independence() {
        let a = WorkerConfig::default().with_enabled(false).with_poll_interval(250);
        let b = WorkerConfig::default().with_poll_interval(250).with_enabled(false);
        assert_eq!(a.poll_interval_ms, b.poll_interval_ms);
        assert_eq!(a.enabled, b.enabled);
    }
}
