//! Task Repository Port (Driven Port)
//!
//! Interface for persisting tasks and driving the compare-and-swap status
//! transitions the scheduler and runners rely on. Any adapter must make the
//! CAS operations atomic with respect to each other; concurrent actors race
//! on these and exactly one may win.

use async_trait::async_trait;

use crate::domain::shared::{Symbol, TaskId};
use crate::domain::task::aggregate::Task;
use crate::domain::task::value_objects::{Progress, TaskResultSummary, TaskStatus};

/// Task persistence error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// No task with the given id.
    #[error("task not found: {task_id}")]
    TaskNotFound {
        /// The id that was looked up.
        task_id: TaskId,
    },

    /// Insert collided with an existing row.
    #[error("task already exists: {task_id}")]
    DuplicateTask {
        /// The id that collided.
        task_id: TaskId,
    },

    /// The store refused a write in the row's current state.
    #[error("conflicting write on task {task_id}: {message}")]
    Conflict {
        /// Task whose row rejected the write.
        task_id: TaskId,
        /// What was refused and why.
        message: String,
    },

    /// Backend failure (connection, serialization, ...).
    #[error("task storage error: {message}")]
    Storage {
        /// Adapter-specific description.
        message: String,
    },
}

/// Outcome of a cancel request against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The task moved to cancelled now.
    Cancelled,
    /// The task was already cancelled; request is a no-op.
    AlreadyCancelled,
    /// The task already completed or failed; nothing to cancel.
    AlreadyTerminal,
}

impl CancelOutcome {
    /// Whether the task ends up cancelled either way.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::AlreadyCancelled)
    }
}

/// Port for task persistence and status transitions.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateTask`] when the id exists.
    async fn insert(&self, task: &Task) -> Result<(), RepositoryError>;

    /// Load a task by id.
    async fn find_by_id(&self, task_id: &TaskId) -> Result<Option<Task>, RepositoryError>;

    /// All tasks currently pending, oldest first.
    async fn find_pending(&self) -> Result<Vec<Task>, RepositoryError>;

    /// Atomically claim a pending task for execution (`pending -> running`).
    ///
    /// Returns `true` when this caller won the claim. `false` means another
    /// actor already moved the task out of pending; the caller must skip it.
    async fn claim_pending(&self, task_id: &TaskId) -> Result<bool, RepositoryError>;

    /// Read the current status, the cooperative-cancellation signal.
    async fn fetch_status(
        &self,
        task_id: &TaskId,
    ) -> Result<Option<TaskStatus>, RepositoryError>;

    /// Persist a dynamically resolved symbol list back onto the task.
    async fn store_symbols(
        &self,
        task_id: &TaskId,
        symbols: &[Symbol],
    ) -> Result<(), RepositoryError>;

    /// Record progress. Writes are monotonic: a smaller value than the
    /// stored one leaves the row untouched.
    async fn record_progress(
        &self,
        task_id: &TaskId,
        progress: Progress,
    ) -> Result<(), RepositoryError>;

    /// Atomically finish a running task (`running -> completed`, progress
    /// pinned to 100, summary stored).
    ///
    /// Returns `false` when the task is no longer running: a concurrent
    /// cancel won and the summary is discarded.
    async fn complete(
        &self,
        task_id: &TaskId,
        summary: TaskResultSummary,
    ) -> Result<bool, RepositoryError>;

    /// Move a non-terminal task to failed with an error message.
    async fn mark_failed(
        &self,
        task_id: &TaskId,
        error_message: &str,
    ) -> Result<(), RepositoryError>;

    /// Cancel a task (`pending | running -> cancelled`). Idempotent.
    async fn cancel(&self, task_id: &TaskId) -> Result<CancelOutcome, RepositoryError>;
}
