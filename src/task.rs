//! Background work with a single completion result.
//!
//! Probes, manifest loads and privileged sequences run on the runtime's
//! worker pools; the foreground starts them, may cancel them, and awaits one
//! result. Cancellation is best effort: a blocking sequence that has started
//! runs to completion.

use std::future::Future;

use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task was cancelled")]
    Cancelled,

    #[error("task panicked: {0}")]
    Panicked(String),
}

pub struct BackgroundTask<T> {
    name: &'static str,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Start an async job on the runtime.
    pub fn start<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        tracing::debug!(task = name, "starting");
        Self {
            name,
            handle: tokio::spawn(future),
        }
    }

    /// Start a blocking job (shell I/O, disk I/O) on the bounded blocking pool.
    pub fn start_blocking<F>(name: &'static str, job: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        tracing::debug!(task = name, "starting blocking");
        Self {
            name,
            handle: tokio::task::spawn_blocking(job),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Request cancellation. Has no effect on a blocking job already running.
    pub fn cancel(&self) {
        tracing::debug!(task = self.name, "cancel requested");
        self.handle.abort();
    }

    /// Wait for the completion result.
    pub async fn join(self) -> Result<T, TaskError> {
        match self.handle.await {
            Ok(value) => Ok(value),
            Err(err) if err.is_cancelled() => Err(TaskError::Cancelled),
            Err(err) => Err(TaskError::Panicked(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn async_task_completes() {
        let task = BackgroundTask::start("probe", async { 21 * 2 });
        assert_eq!(task.join().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn blocking_task_completes() {
        let task = BackgroundTask::start_blocking("flash", || "staged".to_string());
        assert_eq!(task.name(), "flash");
        assert_eq!(task.join().await.unwrap(), "staged");
    }

    #[tokio::test]
    async fn cancelled_async_task_reports_cancelled() {
        let task = BackgroundTask::start("manifest", async {
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        task.cancel();
        assert!(matches!(task.join().await, Err(TaskError::Cancelled)));
    }
}
