//! Polling scheduler: turns pending tasks into detached runner invocations.
//!
//! The loop wakes on a fixed interval, lists pending tasks, and spawns one
//! fire-and-forget runner per task. Claiming happens inside the runner, so a
//! task observed by two consecutive polls (or two scheduler instances) still
//! runs exactly once.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::application::ports::{SymbolResultRepository, TaskRepository, UniversePort};

use super::runner::TaskRunner;

/// Background loop feeding pending tasks to runners.
pub struct TaskScheduler<T, S, U> {
    tasks: Arc<T>,
    runner: Arc<TaskRunner<T, S, U>>,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl<T, S, U> TaskScheduler<T, S, U>
where
    T: TaskRepository + 'static,
    S: SymbolResultRepository + 'static,
    U: UniversePort + 'static,
{
    /// Create a scheduler polling `tasks` every `poll_interval`.
    pub fn new(
        tasks: Arc<T>,
        runner: Arc<TaskRunner<T, S, U>>,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            tasks,
            runner,
            poll_interval,
            shutdown,
        }
    }

    /// Run the polling loop until the shutdown token fires.
    ///
    /// Runners spawned before shutdown keep going; stopping the loop only
    /// stops new pickups.
    pub async fn run(&self) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "task scheduler started"
        );
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("task scheduler shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if self.shutdown.is_cancelled() {
                        info!("task scheduler shutting down");
                        break;
                    }
                    self.poll_once().await;
                }
            }
        }
    }

    /// One poll iteration. Errors are logged and absorbed; the loop never
    /// dies to a bad iteration.
    async fn poll_once(&self) {
        let pending = match self.tasks.find_pending().await {
            Ok(pending) => pending,
            Err(err) => {
                error!(error = %err, "failed to list pending tasks");
                return;
            }
        };
        if pending.is_empty() {
            return;
        }

        debug!(count = pending.len(), "pending tasks picked up");
        for task in pending {
            let runner = Arc::clone(&self.runner);
            let task_id = task.id().clone();
            tokio::spawn(async move {
                // The runner logs and records the failure itself.
                if let Err(err) = runner.run(task_id.clone()).await {
                    debug!(task_id = %task_id, error = %err, "detached run ended in failure");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CancelOutcome, LogRecord, LogSink, RepositoryError};
    use crate::domain::shared::{ExecutionMode, Symbol, TaskId};
    use crate::domain::task::{
        CreateTaskCommand, Progress, Task, TaskParameters, TaskResultSummary, TaskStatus,
        TimeRange,
    };
    use crate::infrastructure::persistence::in_memory::{
        InMemorySymbolResultRepository, InMemoryTaskRepository,
    };
    use crate::infrastructure::universe::StaticUniverse;
    use crate::orchestrator::config::{OrchestratorConfig, WorkerCommand};
    use crate::orchestrator::pool::PoolRegistry;
    use crate::orchestrator::process::ProcessRunner;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct NullSink;

    #[async_trait]
    impl LogSink for NullSink {
        async fn append(&self, _record: LogRecord) {}
    }

    /// Delegating repository that fails `find_pending` a fixed number of
    /// times before behaving normally.
    struct FlakyTaskRepository {
        inner: Arc<InMemoryTaskRepository>,
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl TaskRepository for FlakyTaskRepository {
        async fn insert(&self, task: &Task) -> Result<(), RepositoryError> {
            self.inner.insert(task).await
        }

        async fn find_by_id(&self, task_id: &TaskId) -> Result<Option<Task>, RepositoryError> {
            self.inner.find_by_id(task_id).await
        }

        async fn find_pending(&self) -> Result<Vec<Task>, RepositoryError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(RepositoryError::Storage {
                    message: "injected listing failure".to_string(),
                });
            }
            self.inner.find_pending().await
        }

        async fn claim_pending(&self, task_id: &TaskId) -> Result<bool, RepositoryError> {
            self.inner.claim_pending(task_id).await
        }

        async fn fetch_status(
            &self,
            task_id: &TaskId,
        ) -> Result<Option<TaskStatus>, RepositoryError> {
            self.inner.fetch_status(task_id).await
        }

        async fn store_symbols(
            &self,
            task_id: &TaskId,
            symbols: &[Symbol],
        ) -> Result<(), RepositoryError> {
            self.inner.store_symbols(task_id, symbols).await
        }

        async fn record_progress(
            &self,
            task_id: &TaskId,
            progress: Progress,
        ) -> Result<(), RepositoryError> {
            self.inner.record_progress(task_id, progress).await
        }

        async fn complete(
            &self,
            task_id: &TaskId,
            summary: TaskResultSummary,
        ) -> Result<bool, RepositoryError> {
            self.inner.complete(task_id, summary).await
        }

        async fn mark_failed(
            &self,
            task_id: &TaskId,
            error_message: &str,
        ) -> Result<(), RepositoryError> {
            self.inner.mark_failed(task_id, error_message).await
        }

        async fn cancel(&self, task_id: &TaskId) -> Result<CancelOutcome, RepositoryError> {
            self.inner.cancel(task_id).await
        }
    }

    fn scheduler_over<T: TaskRepository + 'static>(
        tasks: Arc<T>,
        script: &str,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> TaskScheduler<T, InMemorySymbolResultRepository, StaticUniverse> {
        let results = Arc::new(InMemorySymbolResultRepository::new());
        let mut worker = WorkerCommand::new("sh");
        worker.base_args = vec!["-c".to_string(), script.to_string()];
        let config = OrchestratorConfig {
            worker_capacity: 2,
            poll_interval,
            termination_grace: Duration::from_millis(500),
            worker,
        };
        let runner = Arc::new(TaskRunner::new(
            Arc::clone(&tasks),
            results,
            Arc::new(StaticUniverse::default()),
            Arc::new(ProcessRunner::new(
                Arc::new(NullSink),
                config.termination_grace,
            )),
            PoolRegistry::new(),
            config,
        ));
        TaskScheduler::new(tasks, runner, poll_interval, shutdown)
    }

    fn pending_task(symbols: &[&str]) -> Task {
        Task::new(CreateTaskCommand {
            symbols: symbols.iter().copied().map(Symbol::new).collect(),
            index: None,
            time_range: TimeRange::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 30, 15, 0, 0).unwrap(),
            )
            .unwrap(),
            parameters: TaskParameters::new("MACD", ExecutionMode::Backtest),
        })
        .unwrap()
    }

    async fn wait_for_terminal(tasks: &InMemoryTaskRepository, task_id: &TaskId) -> TaskStatus {
        for _ in 0..200 {
            let status = tasks.fetch_status(task_id).await.unwrap().unwrap();
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("task never reached a terminal state");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn picks_up_pending_task_and_completes_it() {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let shutdown = CancellationToken::new();
        let scheduler = Arc::new(scheduler_over(
            Arc::clone(&tasks),
            "true",
            Duration::from_millis(50),
            shutdown.clone(),
        ));

        let task = pending_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        tasks.insert(&task).await.unwrap();

        let loop_handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run().await }
        });

        let status = wait_for_terminal(&tasks, &task_id).await;
        assert_eq!(status, TaskStatus::Completed);

        shutdown.cancel();
        loop_handle.await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn task_spanning_multiple_polls_runs_once() {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let shutdown = CancellationToken::new();
        // Job outlives several poll intervals; only the first claim wins.
        let scheduler = Arc::new(scheduler_over(
            Arc::clone(&tasks),
            "sleep 0.3",
            Duration::from_millis(25),
            shutdown.clone(),
        ));

        let task = pending_task(&["SHSE.600000", "SZSE.000001"]);
        let task_id = task.id().clone();
        tasks.insert(&task).await.unwrap();

        let loop_handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run().await }
        });

        let status = wait_for_terminal(&tasks, &task_id).await;
        assert_eq!(status, TaskStatus::Completed);
        let stored = tasks.find_by_id(&task_id).await.unwrap().unwrap();
        assert_eq!(stored.result_summary().unwrap().total_count, 2);

        shutdown.cancel();
        loop_handle.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let shutdown = CancellationToken::new();
        let scheduler = Arc::new(scheduler_over(
            Arc::clone(&tasks),
            "true",
            Duration::from_millis(10),
            shutdown.clone(),
        ));

        let loop_handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), loop_handle)
            .await
            .expect("loop did not stop on shutdown")
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn listing_failures_do_not_kill_the_loop() {
        let inner = Arc::new(InMemoryTaskRepository::new());
        let flaky = Arc::new(FlakyTaskRepository {
            inner: Arc::clone(&inner),
            failures_left: AtomicU32::new(3),
        });
        let shutdown = CancellationToken::new();
        let scheduler = Arc::new(scheduler_over(
            Arc::clone(&flaky),
            "true",
            Duration::from_millis(25),
            shutdown.clone(),
        ));

        let task = pending_task(&["SHSE.600000"]);
        let task_id = task.id().clone();
        inner.insert(&task).await.unwrap();

        let loop_handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run().await }
        });

        // Three poisoned polls, then the task still gets picked up.
        let status = wait_for_terminal(&inner, &task_id).await;
        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(flaky.failures_left.load(Ordering::SeqCst), 0);

        shutdown.cancel();
        loop_handle.await.unwrap();
    }
}
