//! Submit Task Use Case

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::ports::{RepositoryError, TaskRepository};
use crate::domain::task::aggregate::{CreateTaskCommand, Task};
use crate::domain::task::errors::TaskError;

/// Why a submission was refused.
#[derive(Debug, Error)]
pub enum SubmitTaskError {
    /// The request does not describe a runnable task.
    #[error("invalid task: {0}")]
    Validation(#[from] TaskError),

    /// The store rejected the insert.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Use case for submitting a new backtest task.
pub struct SubmitTaskUseCase<T>
where
    T: TaskRepository,
{
    tasks: Arc<T>,
}

impl<T> SubmitTaskUseCase<T>
where
    T: TaskRepository,
{
    /// Create a new `SubmitTaskUseCase`.
    pub const fn new(tasks: Arc<T>) -> Self {
        Self { tasks }
    }

    /// Validate and store a new pending task.
    ///
    /// The scheduler picks the task up on its next poll; submission itself
    /// starts nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitTaskError::Validation`] for a malformed request and
    /// [`SubmitTaskError::Repository`] when the insert fails.
    pub async fn submit(&self, command: CreateTaskCommand) -> Result<Task, SubmitTaskError> {
        // 1. Build the aggregate; validation happens here.
        let task = Task::new(command)?;

        // 2. Store it pending.
        self.tasks.insert(&task).await?;

        info!(
            task_id = %task.id(),
            symbols = task.symbols().len(),
            index = ?task.index(),
            "task submitted"
        );
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{ExecutionMode, IndexCode, Symbol};
    use crate::domain::task::value_objects::{TaskParameters, TaskStatus, TimeRange};
    use crate::infrastructure::persistence::in_memory::InMemoryTaskRepository;
    use chrono::{TimeZone, Utc};

    fn time_range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 30, 15, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn submit_stores_pending_task() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let use_case = SubmitTaskUseCase::new(Arc::clone(&repo));

        let task = use_case
            .submit(CreateTaskCommand {
                symbols: vec![Symbol::new("SHSE.600000")],
                index: None,
                time_range: time_range(),
                parameters: TaskParameters::new("MACD", ExecutionMode::Backtest),
            })
            .await
            .unwrap();

        assert_eq!(task.status(), TaskStatus::Pending);
        let stored = repo.find_by_id(task.id()).await.unwrap().unwrap();
        assert_eq!(stored.id(), task.id());
    }

    #[tokio::test]
    async fn submit_accepts_index_only_request() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let use_case = SubmitTaskUseCase::new(Arc::clone(&repo));

        let task = use_case
            .submit(CreateTaskCommand {
                symbols: vec![],
                index: Some(IndexCode::new("SHSE.000300")),
                time_range: time_range(),
                parameters: TaskParameters::new("BOLL", ExecutionMode::Backtest),
            })
            .await
            .unwrap();

        assert!(task.symbols().is_empty());
        assert!(task.index().is_some());
    }

    #[tokio::test]
    async fn submit_rejects_empty_request() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let use_case = SubmitTaskUseCase::new(Arc::clone(&repo));

        let result = use_case
            .submit(CreateTaskCommand {
                symbols: vec![],
                index: None,
                time_range: time_range(),
                parameters: TaskParameters::new("MACD", ExecutionMode::Backtest),
            })
            .await;

        assert!(matches!(result, Err(SubmitTaskError::Validation(_))));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_blank_strategy() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let use_case = SubmitTaskUseCase::new(Arc::clone(&repo));

        let result = use_case
            .submit(CreateTaskCommand {
                symbols: vec![Symbol::new("SHSE.600000")],
                index: None,
                time_range: time_range(),
                parameters: TaskParameters::new("   ", ExecutionMode::Backtest),
            })
            .await;

        assert!(matches!(result, Err(SubmitTaskError::Validation(_))));
    }
}
