//! In-memory task and symbol-result repositories.
//!
//! Suitable for testing and development. Not for production use. Every
//! status transition happens under the write lock, which is what makes the
//! claim/complete/cancel operations behave as compare-and-swap.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{
    CancelOutcome, RepositoryError, SymbolResultRepository, TaskRepository,
};
use crate::domain::shared::{Symbol, TaskId};
use crate::domain::task::aggregate::Task;
use crate::domain::task::value_objects::{
    Progress, SymbolMetrics, SymbolResult, TaskResultSummary, TaskStatus,
};

/// In-memory implementation of `TaskRepository`.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of tasks in the repository.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Clear all tasks from the repository.
    pub fn clear(&self) {
        self.tasks.write().clear();
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: &Task) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write();
        if tasks.contains_key(task.id()) {
            return Err(RepositoryError::DuplicateTask {
                task_id: task.id().clone(),
            });
        }
        tasks.insert(task.id().clone(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, task_id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        Ok(self.tasks.read().get(task_id).cloned())
    }

    async fn find_pending(&self) -> Result<Vec<Task>, RepositoryError> {
        let tasks = self.tasks.read();
        let mut pending: Vec<Task> = tasks
            .values()
            .filter(|t| t.status() == TaskStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(Task::created_at);
        Ok(pending)
    }

    async fn claim_pending(&self, task_id: &TaskId) -> Result<bool, RepositoryError> {
        let mut tasks = self.tasks.write();
        let Some(task) = tasks.get_mut(task_id) else {
            return Err(RepositoryError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };
        if task.status() != TaskStatus::Pending {
            return Ok(false);
        }
        task.begin().map_err(|err| RepositoryError::Conflict {
            task_id: task_id.clone(),
            message: err.to_string(),
        })?;
        Ok(true)
    }

    async fn fetch_status(
        &self,
        task_id: &TaskId,
    ) -> Result<Option<TaskStatus>, RepositoryError> {
        Ok(self.tasks.read().get(task_id).map(Task::status))
    }

    async fn store_symbols(
        &self,
        task_id: &TaskId,
        symbols: &[Symbol],
    ) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write();
        let Some(task) = tasks.get_mut(task_id) else {
            return Err(RepositoryError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };
        task.resolve_symbols(symbols.to_vec())
            .map_err(|err| RepositoryError::Conflict {
                task_id: task_id.clone(),
                message: err.to_string(),
            })
    }

    async fn record_progress(
        &self,
        task_id: &TaskId,
        progress: Progress,
    ) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write();
        let Some(task) = tasks.get_mut(task_id) else {
            return Err(RepositoryError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };
        task.record_progress(progress)
            .map_err(|err| RepositoryError::Conflict {
                task_id: task_id.clone(),
                message: err.to_string(),
            })
    }

    async fn complete(
        &self,
        task_id: &TaskId,
        summary: TaskResultSummary,
    ) -> Result<bool, RepositoryError> {
        let mut tasks = self.tasks.write();
        let Some(task) = tasks.get_mut(task_id) else {
            return Err(RepositoryError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };
        if task.status() != TaskStatus::Running {
            return Ok(false);
        }
        task.complete(summary).map_err(|err| RepositoryError::Conflict {
            task_id: task_id.clone(),
            message: err.to_string(),
        })?;
        Ok(true)
    }

    async fn mark_failed(
        &self,
        task_id: &TaskId,
        error_message: &str,
    ) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write();
        let Some(task) = tasks.get_mut(task_id) else {
            return Err(RepositoryError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };
        task.fail(error_message).map_err(|err| RepositoryError::Conflict {
            task_id: task_id.clone(),
            message: err.to_string(),
        })
    }

    async fn cancel(&self, task_id: &TaskId) -> Result<CancelOutcome, RepositoryError> {
        let mut tasks = self.tasks.write();
        let Some(task) = tasks.get_mut(task_id) else {
            return Err(RepositoryError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };
        match task.status() {
            TaskStatus::Cancelled => Ok(CancelOutcome::AlreadyCancelled),
            TaskStatus::Completed | TaskStatus::Failed => Ok(CancelOutcome::AlreadyTerminal),
            TaskStatus::Pending | TaskStatus::Running => {
                task.cancel().map_err(|err| RepositoryError::Conflict {
                    task_id: task_id.clone(),
                    message: err.to_string(),
                })?;
                Ok(CancelOutcome::Cancelled)
            }
        }
    }
}

/// In-memory implementation of `SymbolResultRepository`.
///
/// Rows are keyed by `(task_id, symbol)`, mirroring the real table's unique
/// key. [`record_metrics`](InMemorySymbolResultRepository::record_metrics)
/// stands in for the write the worker process performs on its own.
#[derive(Debug, Default)]
pub struct InMemorySymbolResultRepository {
    rows: RwLock<HashMap<(TaskId, Symbol), SymbolResult>>,
}

impl InMemorySymbolResultRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of rows in the repository.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Record the metrics a worker produced for its symbol, marking the row
    /// finished.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] when the row was never
    /// initialized.
    pub fn record_metrics(
        &self,
        task_id: &TaskId,
        symbol: &Symbol,
        metrics: SymbolMetrics,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(&(task_id.clone(), symbol.clone())) else {
            return Err(RepositoryError::Conflict {
                task_id: task_id.clone(),
                message: format!("no result row for symbol {symbol}"),
            });
        };
        row.finish(Some(metrics));
        Ok(())
    }
}

#[async_trait]
impl SymbolResultRepository for InMemorySymbolResultRepository {
    async fn init_results(
        &self,
        task_id: &TaskId,
        symbols: &[Symbol],
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write();
        for symbol in symbols {
            rows.insert(
                (task_id.clone(), symbol.clone()),
                SymbolResult::init(task_id.clone(), symbol.clone()),
            );
        }
        Ok(())
    }

    async fn mark_finished(
        &self,
        task_id: &TaskId,
        symbol: &Symbol,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(&(task_id.clone(), symbol.clone())) else {
            return Err(RepositoryError::Conflict {
                task_id: task_id.clone(),
                message: format!("no result row for symbol {symbol}"),
            });
        };
        row.finish(None);
        Ok(())
    }

    async fn count_finished(&self, task_id: &TaskId) -> Result<u64, RepositoryError> {
        let rows = self.rows.read();
        Ok(rows
            .values()
            .filter(|r| &r.task_id == task_id && r.status.is_finished())
            .count() as u64)
    }

    async fn finished_results(
        &self,
        task_id: &TaskId,
    ) -> Result<Vec<SymbolResult>, RepositoryError> {
        let rows = self.rows.read();
        let mut finished: Vec<SymbolResult> = rows
            .values()
            .filter(|r| &r.task_id == task_id && r.status.is_finished())
            .cloned()
            .collect();
        finished.sort_by(|a, b| a.symbol.as_str().cmp(b.symbol.as_str()));
        Ok(finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::ExecutionMode;
    use crate::domain::task::aggregate::CreateTaskCommand;
    use crate::domain::task::value_objects::{TaskParameters, TimeRange};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn create_test_task(symbols: &[&str]) -> Task {
        let command = CreateTaskCommand {
            symbols: symbols.iter().copied().map(Symbol::new).collect(),
            index: None,
            time_range: TimeRange::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 30, 15, 0, 0).unwrap(),
            )
            .unwrap(),
            parameters: TaskParameters::new("MACD", ExecutionMode::Backtest),
        };
        Task::new(command).unwrap()
    }

    #[tokio::test]
    async fn insert_and_find_by_id() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        let task_id = task.id().clone();

        repo.insert(&task).await.unwrap();

        let found = repo.find_by_id(&task_id).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        repo.insert(&task).await.unwrap();

        let second = repo.insert(&task).await;
        assert!(matches!(second, Err(RepositoryError::DuplicateTask { .. })));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn find_pending_oldest_first() {
        let repo = InMemoryTaskRepository::new();
        let first = create_test_task(&["SHSE.600000"]);
        let second = create_test_task(&["SZSE.000001"]);
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        // Move the older one out of pending; only the newer remains.
        assert!(repo.claim_pending(first.id()).await.unwrap());

        let pending = repo.find_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id(), second.id());
    }

    #[tokio::test]
    async fn claim_pending_wins_exactly_once() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        repo.insert(&task).await.unwrap();

        assert!(repo.claim_pending(&task_id).await.unwrap());
        assert!(!repo.claim_pending(&task_id).await.unwrap());
        assert_eq!(
            repo.fetch_status(&task_id).await.unwrap(),
            Some(TaskStatus::Running)
        );
    }

    #[tokio::test]
    async fn claim_pending_unknown_task_errors() {
        let repo = InMemoryTaskRepository::new();
        let result = repo.claim_pending(&TaskId::new("missing")).await;
        assert!(matches!(result, Err(RepositoryError::TaskNotFound { .. })));
    }

    #[tokio::test]
    async fn complete_is_a_running_to_completed_swap() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        repo.insert(&task).await.unwrap();

        // Not running yet: the swap loses.
        assert!(!repo
            .complete(&task_id, TaskResultSummary::empty(0, "early"))
            .await
            .unwrap());

        assert!(repo.claim_pending(&task_id).await.unwrap());
        assert!(repo
            .complete(&task_id, TaskResultSummary::empty(1, "done"))
            .await
            .unwrap());

        let stored = repo.find_by_id(&task_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), TaskStatus::Completed);
        assert!(stored.progress().is_complete());
    }

    #[tokio::test]
    async fn complete_loses_to_cancel() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        repo.insert(&task).await.unwrap();
        assert!(repo.claim_pending(&task_id).await.unwrap());
        assert!(repo.cancel(&task_id).await.unwrap().is_cancelled());

        assert!(!repo
            .complete(&task_id, TaskResultSummary::empty(1, "late"))
            .await
            .unwrap());
        assert_eq!(
            repo.fetch_status(&task_id).await.unwrap(),
            Some(TaskStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn cancel_outcomes_by_state() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        repo.insert(&task).await.unwrap();

        assert_eq!(
            repo.cancel(&task_id).await.unwrap(),
            CancelOutcome::Cancelled
        );
        assert_eq!(
            repo.cancel(&task_id).await.unwrap(),
            CancelOutcome::AlreadyCancelled
        );

        let completed = create_test_task(&["SZSE.000001"]);
        let completed_id = completed.id().clone();
        repo.insert(&completed).await.unwrap();
        assert!(repo.claim_pending(&completed_id).await.unwrap());
        assert!(repo
            .complete(&completed_id, TaskResultSummary::empty(1, "done"))
            .await
            .unwrap());
        assert_eq!(
            repo.cancel(&completed_id).await.unwrap(),
            CancelOutcome::AlreadyTerminal
        );
    }

    #[tokio::test]
    async fn record_progress_requires_running() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        repo.insert(&task).await.unwrap();

        let rejected = repo
            .record_progress(&task_id, Progress::from_counts(1, 2))
            .await;
        assert!(matches!(rejected, Err(RepositoryError::Conflict { .. })));

        assert!(repo.claim_pending(&task_id).await.unwrap());
        repo.record_progress(&task_id, Progress::from_counts(1, 2))
            .await
            .unwrap();
        let stored = repo.find_by_id(&task_id).await.unwrap().unwrap();
        assert_eq!(stored.progress().value(), 50);
    }

    #[tokio::test]
    async fn record_progress_never_moves_backwards() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        repo.insert(&task).await.unwrap();
        assert!(repo.claim_pending(&task_id).await.unwrap());

        repo.record_progress(&task_id, Progress::from_counts(3, 4))
            .await
            .unwrap();
        repo.record_progress(&task_id, Progress::from_counts(1, 4))
            .await
            .unwrap();

        let stored = repo.find_by_id(&task_id).await.unwrap().unwrap();
        assert_eq!(stored.progress().value(), 75);
    }

    #[tokio::test]
    async fn mark_failed_records_message() {
        let repo = InMemoryTaskRepository::new();
        let task = create_test_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        repo.insert(&task).await.unwrap();
        assert!(repo.claim_pending(&task_id).await.unwrap());

        repo.mark_failed(&task_id, "universe exploded").await.unwrap();

        let stored = repo.find_by_id(&task_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), TaskStatus::Failed);
        assert_eq!(stored.error_message(), Some("universe exploded"));
    }

    #[tokio::test]
    async fn store_symbols_persists_resolved_universe() {
        let repo = InMemoryTaskRepository::new();
        let task = Task::new(CreateTaskCommand {
            symbols: vec![],
            index: Some(crate::domain::shared::IndexCode::new("SHSE.000300")),
            time_range: TimeRange::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 30, 15, 0, 0).unwrap(),
            )
            .unwrap(),
            parameters: TaskParameters::new("MACD", ExecutionMode::Backtest),
        })
        .unwrap();
        let task_id = task.id().clone();
        repo.insert(&task).await.unwrap();
        assert!(repo.claim_pending(&task_id).await.unwrap());

        let resolved = vec![Symbol::new("SHSE.600000"), Symbol::new("SHSE.600036")];
        repo.store_symbols(&task_id, &resolved).await.unwrap();

        let stored = repo.find_by_id(&task_id).await.unwrap().unwrap();
        assert_eq!(stored.symbols(), resolved.as_slice());
    }

    #[tokio::test]
    async fn symbol_rows_init_mark_count() {
        let repo = InMemorySymbolResultRepository::new();
        let task_id = TaskId::new("task-1");
        let symbols = vec![Symbol::new("SHSE.600000"), Symbol::new("SZSE.000001")];

        repo.init_results(&task_id, &symbols).await.unwrap();
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.count_finished(&task_id).await.unwrap(), 0);

        repo.mark_finished(&task_id, &symbols[0]).await.unwrap();
        // Idempotent re-mark.
        repo.mark_finished(&task_id, &symbols[0]).await.unwrap();
        assert_eq!(repo.count_finished(&task_id).await.unwrap(), 1);

        let finished = repo.finished_results(&task_id).await.unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].symbol, symbols[0]);
    }

    #[tokio::test]
    async fn mark_finished_without_init_is_an_error() {
        let repo = InMemorySymbolResultRepository::new();
        let result = repo
            .mark_finished(&TaskId::new("task-1"), &Symbol::new("SHSE.600000"))
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
    }

    #[tokio::test]
    async fn record_metrics_feeds_finished_results() {
        let repo = InMemorySymbolResultRepository::new();
        let task_id = TaskId::new("task-1");
        let symbol = Symbol::new("SHSE.600000");
        repo.init_results(&task_id, std::slice::from_ref(&symbol))
            .await
            .unwrap();

        let metrics = SymbolMetrics {
            pnl_ratio: dec!(0.12),
            sharp_ratio: dec!(1.4),
            max_drawdown: dec!(0.08),
            win_ratio: dec!(0.6),
        };
        repo.record_metrics(&task_id, &symbol, metrics).unwrap();

        // The orchestrator's own mark keeps the worker's metrics.
        repo.mark_finished(&task_id, &symbol).await.unwrap();

        let finished = repo.finished_results(&task_id).await.unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].metrics.as_ref().unwrap().pnl_ratio, metrics.pnl_ratio);
    }

    #[tokio::test]
    async fn rows_are_scoped_per_task() {
        let repo = InMemorySymbolResultRepository::new();
        let symbol = Symbol::new("SHSE.600000");
        repo.init_results(&TaskId::new("task-1"), std::slice::from_ref(&symbol))
            .await
            .unwrap();
        repo.init_results(&TaskId::new("task-2"), std::slice::from_ref(&symbol))
            .await
            .unwrap();

        repo.mark_finished(&TaskId::new("task-1"), &symbol)
            .await
            .unwrap();

        assert_eq!(repo.count_finished(&TaskId::new("task-1")).await.unwrap(), 1);
        assert_eq!(repo.count_finished(&TaskId::new("task-2")).await.unwrap(), 0);
    }
}
