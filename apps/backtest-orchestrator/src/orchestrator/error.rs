//! Error types for task orchestration.

use thiserror::Error;

use crate::application::ports::{RepositoryError, UniverseError};
use crate::domain::shared::TaskId;
use crate::domain::task::TaskError;

/// Errors from running a task end to end.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The task id does not exist in the store.
    #[error("task not found: {task_id}")]
    TaskNotFound {
        /// The id that was looked up.
        task_id: TaskId,
    },

    /// The task has no symbols and its index resolved to none.
    #[error("task {task_id} has no symbols to run (index resolved empty)")]
    EmptyUniverse {
        /// The task whose universe is empty.
        task_id: TaskId,
    },

    /// At least one job could not be launched at all.
    #[error("worker launch failed for symbol {symbol}: {message}")]
    JobLaunch {
        /// Symbol whose job failed to start.
        symbol: String,
        /// Spawn error description.
        message: String,
    },

    /// Domain invariant violated while driving the task.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Persistence failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Index resolution failure.
    #[error(transparent)]
    Universe(#[from] UniverseError),
}
