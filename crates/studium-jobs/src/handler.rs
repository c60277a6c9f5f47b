//! Task handler trait and execution context.

use async_trait::async_trait;

use studium_core::{Task, TaskKind};

/// Progress callback wired by the worker to persist the latest event.
pub type ProgressCallback = Box<dyn Fn(i32, Option<&str>) + Send + Sync>;

/// Context provided to task handlers.
pub struct TaskContext {
    /// The task being processed.
    pub task: Task,
    progress_callback: Option<ProgressCallback>,
}

impl TaskContext {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(i32, Option<&str>) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Report progress to the callback.
    pub fn report_progress(&self, percent: i32, message: Option<&str>) {
        if let Some(ref callback) = self.progress_callback {
            callback(percent, message);
        }
    }

    /// The entity this task operates on (document or podcast version).
    pub fn entity_id(&self) -> i64 {
        self.task.entity_id
    }
}

/// Result of task execution.
#[derive(Debug)]
pub enum TaskResult {
    /// Task completed successfully.
    Success,
    /// Task failed with an error message.
    Failed(String),
}

/// Trait for task handlers.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The task kind this handler processes.
    fn kind(&self) -> TaskKind;

    /// Execute the task.
    async fn execute(&self, ctx: TaskContext) -> TaskResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use studium_core::TaskStatus;

    fn task() -> Task {
        Task {
            id: 1,
            kind: TaskKind::Ingest,
            entity_id: 42,
            status: TaskStatus::Running,
            payload: None,
            error_message: None,
            progress_percent: 0,
            progress_message: None,
            cancel_requested: false,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    #[test]
    fn context_entity_id() {
        let ctx = TaskContext::new(task());
        assert_eq!(ctx.entity_id(), 42);
    }

    #[test]
    fn report_progress_without_callback_is_noop() {
        let ctx = TaskContext::new(task());
        ctx.report_progress(50, Some("halfway"));
    }

    #[test]
    fn report_progress_invokes_callback() {
        use std::sync::{Arc, Mutex};

        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let ctx = TaskContext::new(task()).with_progress_callback(move |pct, msg| {
            log_clone.lock().unwrap().push((pct, msg.map(String::from)));
        });

        ctx.report_progress(25, Some("extracting"));
        ctx.report_progress(100, None);

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], (25, Some("extracting".to_string())));
        assert_eq!(log[1], (100, None));
    }
}
