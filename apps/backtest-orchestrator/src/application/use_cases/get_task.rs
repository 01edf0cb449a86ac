//! Get Task Use Case

use std::sync::Arc;

use crate::application::ports::{RepositoryError, SymbolResultRepository, TaskRepository};
use crate::domain::shared::TaskId;
use crate::domain::task::aggregate::Task;

/// Read model for one task: the row plus its finished-symbol count.
#[derive(Debug, Clone)]
pub struct TaskDetails {
    /// The task as stored.
    pub task: Task,
    /// Symbol rows already finished.
    pub finished_count: u64,
}

/// Use case for reading a task's state.
pub struct GetTaskUseCase<T, S>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    tasks: Arc<T>,
    results: Arc<S>,
}

impl<T, S> GetTaskUseCase<T, S>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    /// Create a new `GetTaskUseCase`.
    pub const fn new(tasks: Arc<T>, results: Arc<S>) -> Self {
        Self { tasks, results }
    }

    /// Load a task with its finished-symbol count.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::TaskNotFound`] for an unknown id.
    pub async fn get(&self, task_id: &TaskId) -> Result<TaskDetails, RepositoryError> {
        let Some(task) = self.tasks.find_by_id(task_id).await? else {
            return Err(RepositoryError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };
        let finished_count = self.results.count_finished(task_id).await?;
        Ok(TaskDetails {
            task,
            finished_count,
        })
    }
}
