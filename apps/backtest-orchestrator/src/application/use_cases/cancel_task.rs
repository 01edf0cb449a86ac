//! Cancel Task Use Case

use std::sync::Arc;

use tracing::info;

use crate::application::ports::{CancelOutcome, RepositoryError, TaskRepository};
use crate::domain::shared::TaskId;
use crate::orchestrator::PoolRegistry;

/// What a cancel request did.
#[derive(Debug, Clone, Copy)]
pub struct CancelReport {
    /// Store-level outcome.
    pub outcome: CancelOutcome,
    /// Whether a live pool was told to stop.
    pub pool_notified: bool,
}

/// Use case for cancelling a task.
pub struct CancelTaskUseCase<T>
where
    T: TaskRepository,
{
    tasks: Arc<T>,
    pools: PoolRegistry,
}

impl<T> CancelTaskUseCase<T>
where
    T: TaskRepository,
{
    /// Create a new `CancelTaskUseCase`.
    pub const fn new(tasks: Arc<T>, pools: PoolRegistry) -> Self {
        Self { tasks, pools }
    }

    /// Cancel a task, stopping its in-flight run when one exists.
    ///
    /// Idempotent: cancelling twice reports `AlreadyCancelled` the second
    /// time, never an error. A completed or failed task stays as it is and
    /// reports `AlreadyTerminal`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::TaskNotFound`] for an unknown id and
    /// storage errors as they occur.
    pub async fn cancel(&self, task_id: &TaskId) -> Result<CancelReport, RepositoryError> {
        // 1. Flip the row first so no new runner claims the task and
        //    in-flight runners observe the cancel on their next check.
        let outcome = self.tasks.cancel(task_id).await?;

        // 2. Reach into the live run, when there is one.
        let mut pool_notified = false;
        if outcome.is_cancelled() {
            if let Some(pool) = self.pools.get(task_id) {
                pool.cancel().await;
                pool_notified = true;
            }
        }

        info!(task_id = %task_id, ?outcome, pool_notified, "cancel requested");
        Ok(CancelReport {
            outcome,
            pool_notified,
        })
    }
}
