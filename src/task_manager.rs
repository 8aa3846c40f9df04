//! Task management for async service lifecycle.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Manages named background tasks with graceful shutdown.
///
/// Every service task receives a child token of the global cancellation
/// token; shutdown cancels them all and waits with a timeout.
pub struct TaskManager {
    tasks: HashMap<String, JoinHandle<Result<()>>>,
    global_token: CancellationToken,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            global_token: CancellationToken::new(),
        }
    }

    /// Spawns and registers a task under the given name.
    pub async fn spawn_task<F, Fut>(&mut self, name: String, task_fn: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let task_token = self.global_token.child_token();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            info!("Starting task: {task_name}");
            match task_fn(task_token).await {
                Ok(()) => {
                    info!("Task '{task_name}' completed");
                    Ok(())
                }
                Err(e) => {
                    error!("Task '{task_name}' failed: {e}");
                    Err(e)
                }
            }
        });

        self.tasks.insert(name, handle);
        Ok(())
    }

    /// Cancels and joins every registered task, returning the first error
    /// encountered, if any.
    pub async fn shutdown_all(&mut self) -> Result<()> {
        info!("Stopping all {} tasks", self.tasks.len());

        self.global_token.cancel();

        let mut first_error = None;
        let handles: Vec<_> = self.tasks.drain().map(|(_, handle)| handle).collect();

        for handle in handles {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    warn!("Task failed during shutdown: {e}");
                    first_error.get_or_insert(e);
                }
                Ok(Err(e)) => {
                    let error = anyhow::anyhow!("Task panicked: {e}");
                    error!("{error}");
                    first_error.get_or_insert(error);
                }
                Err(_) => {
                    let error = anyhow::anyhow!("Task shutdown timeout exceeded");
                    error!("{error}");
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error).context("One or more tasks failed during shutdown"),
            None => {
                info!("All tasks stopped");
                Ok(())
            }
        }
    }

    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    #[cfg(test)]
    pub fn is_running(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn spawned_task_is_tracked_and_joined_on_shutdown() {
        let mut manager = TaskManager::new();
        manager
            .spawn_task("worker".to_string(), |token| async move {
                token.cancelled().await;
                Ok(())
            })
            .await
            .unwrap();

        assert!(manager.is_running("worker"));
        assert_eq!(manager.active_count(), 1);

        manager.shutdown_all().await.unwrap();
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn failing_task_error_surfaces_at_shutdown() {
        let mut manager = TaskManager::new();
        manager
            .spawn_task("broken".to_string(), |_token| async move {
                Err(anyhow::anyhow!("boom"))
            })
            .await
            .unwrap();

        // Give the task time to finish with its error.
        sleep(Duration::from_millis(10)).await;

        let result = manager.shutdown_all().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn shutdown_with_no_tasks_is_ok() {
        let mut manager = TaskManager::new();
        manager.shutdown_all().await.unwrap();
    }
}
