//! Symbol Result Repository Port (Driven Port)
//!
//! Interface for the per-symbol result rows a task fans out into. Rows are
//! keyed by `(task_id, symbol)`; the orchestrator creates them all upfront
//! and flips them to finished as jobs exit.

use async_trait::async_trait;

use super::task_repository::RepositoryError;
use crate::domain::shared::{Symbol, TaskId};
use crate::domain::task::value_objects::SymbolResult;

/// Port for per-symbol result persistence.
#[async_trait]
pub trait SymbolResultRepository: Send + Sync {
    /// Create one `Init` row per symbol for a task.
    async fn init_results(
        &self,
        task_id: &TaskId,
        symbols: &[Symbol],
    ) -> Result<(), RepositoryError>;

    /// Flip a row to `Finished`. Idempotent; a missing row is an error.
    async fn mark_finished(
        &self,
        task_id: &TaskId,
        symbol: &Symbol,
    ) -> Result<(), RepositoryError>;

    /// Number of finished rows for a task.
    async fn count_finished(&self, task_id: &TaskId) -> Result<u64, RepositoryError>;

    /// All finished rows for a task, aggregation input.
    async fn finished_results(
        &self,
        task_id: &TaskId,
    ) -> Result<Vec<SymbolResult>, RepositoryError>;
}
