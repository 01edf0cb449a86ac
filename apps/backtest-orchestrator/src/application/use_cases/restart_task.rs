//! Restart Task Use Case

use std::sync::Arc;

use tracing::info;

use crate::application::ports::{RepositoryError, TaskRepository};
use crate::domain::shared::TaskId;
use crate::domain::task::aggregate::Task;

/// Use case for re-running a task's request as a fresh task.
pub struct RestartTaskUseCase<T>
where
    T: TaskRepository,
{
    tasks: Arc<T>,
}

impl<T> RestartTaskUseCase<T>
where
    T: TaskRepository,
{
    /// Create a new `RestartTaskUseCase`.
    pub const fn new(tasks: Arc<T>) -> Self {
        Self { tasks }
    }

    /// Clone the source task's request into a brand-new pending task.
    ///
    /// The source row is never touched: terminal states stay terminal, and
    /// the new task gets its own id. An index-driven source comes back with
    /// its symbol list cleared so the universe is resolved afresh.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::TaskNotFound`] for an unknown source id.
    pub async fn restart(&self, task_id: &TaskId) -> Result<Task, RepositoryError> {
        // 1. Load the source; any status may be restarted.
        let Some(source) = self.tasks.find_by_id(task_id).await? else {
            return Err(RepositoryError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };

        // 2. Insert the clone pending.
        let clone = source.clone_for_restart();
        self.tasks.insert(&clone).await?;

        info!(source = %task_id, task_id = %clone.id(), "task restarted");
        Ok(clone)
    }
}
