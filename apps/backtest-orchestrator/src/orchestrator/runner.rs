//! Single-task execution: claim, resolve the universe, fan out, aggregate.
//!
//! One runner invocation drives one task through its whole lifecycle. The
//! scheduler spawns these fire-and-forget; the atomic claim at entry makes
//! duplicate spawns for the same task harmless.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::application::ports::{SymbolResultRepository, TaskRepository, UniversePort};
use crate::domain::shared::{Symbol, TaskId};
use crate::domain::task::{Progress, Task, TaskResultSummary, TaskStatus};

use super::config::OrchestratorConfig;
use super::error::OrchestratorError;
use super::job::Job;
use super::pool::{DispatchHooks, PoolRegistry, WorkerPool};
use super::process::{JobExit, ProcessRunner};

/// Executes one task end to end against a fresh worker pool.
pub struct TaskRunner<T, S, U> {
    tasks: Arc<T>,
    results: Arc<S>,
    universe: Arc<U>,
    process_runner: Arc<ProcessRunner>,
    pools: PoolRegistry,
    config: OrchestratorConfig,
}

impl<T, S, U> TaskRunner<T, S, U>
where
    T: TaskRepository + 'static,
    S: SymbolResultRepository + 'static,
    U: UniversePort + 'static,
{
    /// Create a runner over the given ports.
    pub fn new(
        tasks: Arc<T>,
        results: Arc<S>,
        universe: Arc<U>,
        process_runner: Arc<ProcessRunner>,
        pools: PoolRegistry,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            tasks,
            results,
            universe,
            process_runner,
            pools,
            config,
        }
    }

    /// Run the task to a terminal state.
    ///
    /// An already-cancelled task and a lost claim both return `Ok` without
    /// doing anything. Any error is recorded on the task as a failure before
    /// being handed back.
    ///
    /// # Errors
    ///
    /// Returns the error that failed the task: an unknown id, an
    /// unresolvable universe, a job that never launched, or a storage
    /// failure.
    pub async fn run(&self, task_id: TaskId) -> Result<(), OrchestratorError> {
        match self.execute(&task_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(task_id = %task_id, error = %err, "task run failed");
                // Best effort: a storage error here must not mask the
                // original failure.
                if let Err(mark_err) = self.tasks.mark_failed(&task_id, &err.to_string()).await {
                    error!(
                        task_id = %task_id,
                        error = %mark_err,
                        "failed to record task failure"
                    );
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, task_id: &TaskId) -> Result<(), OrchestratorError> {
        let status = self.tasks.fetch_status(task_id).await?;
        let Some(status) = status else {
            return Err(OrchestratorError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };
        if status == TaskStatus::Cancelled {
            info!(task_id = %task_id, "task already cancelled, skipping run");
            return Ok(());
        }
        if !self.tasks.claim_pending(task_id).await? {
            debug!(task_id = %task_id, "claim lost, another runner owns this task");
            return Ok(());
        }

        let Some(mut task) = self.tasks.find_by_id(task_id).await? else {
            return Err(OrchestratorError::TaskNotFound {
                task_id: task_id.clone(),
            });
        };

        let symbols = self.resolve_symbols(&mut task).await?;
        self.results.init_results(task_id, &symbols).await?;

        let jobs: Vec<Job> = symbols
            .iter()
            .map(|symbol| {
                Job::build(
                    &self.config.worker,
                    Some(task_id.clone()),
                    symbol.clone(),
                    task.time_range(),
                    task.parameters(),
                )
            })
            .collect();
        let total = jobs.len() as u64;

        info!(
            task_id = %task_id,
            jobs = total,
            capacity = self.config.worker_capacity,
            "task claimed, dispatching"
        );

        let pool = Arc::new(WorkerPool::new(
            self.config.worker_capacity,
            Arc::clone(&self.process_runner),
        ));
        self.pools.register(task_id.clone(), Arc::clone(&pool));

        let hooks = Arc::new(RunnerHooks {
            tasks: Arc::clone(&self.tasks),
            results: Arc::clone(&self.results),
            task_id: task_id.clone(),
            total,
        });
        let report = pool.run(jobs, hooks).await;
        self.pools.remove(task_id);

        // Cancellation wins over aggregation: a cancelled run leaves the
        // task exactly as the cancel path put it.
        let status = self.tasks.fetch_status(task_id).await?;
        if report.cancelled || status == Some(TaskStatus::Cancelled) {
            info!(task_id = %task_id, "task cancelled, skipping aggregation");
            return Ok(());
        }

        if let Some((symbol, message)) = report.first_launch_error() {
            return Err(OrchestratorError::JobLaunch {
                symbol: symbol.as_str().to_string(),
                message: message.clone(),
            });
        }

        let finished = self.results.finished_results(task_id).await?;
        let summary = TaskResultSummary::aggregate(&finished);
        if self.tasks.complete(task_id, summary).await? {
            info!(
                task_id = %task_id,
                total,
                finished = finished.len(),
                failed = report.failed,
                "task completed"
            );
        } else {
            info!(task_id = %task_id, "task left running before completion, summary discarded");
        }
        Ok(())
    }

    /// The symbol list to fan out over, expanding the index when the task
    /// carries no explicit symbols. An expansion is persisted back onto the
    /// task so later reads see the resolved universe.
    async fn resolve_symbols(&self, task: &mut Task) -> Result<Vec<Symbol>, OrchestratorError> {
        if !task.symbols().is_empty() {
            return Ok(task.symbols().to_vec());
        }
        let Some(index) = task.index() else {
            // Command validation rejects this shape; a stored task with
            // neither symbols nor index is corrupt.
            return Err(OrchestratorError::EmptyUniverse {
                task_id: task.id().clone(),
            });
        };

        let constituents = self.universe.index_constituents(index).await?;
        if constituents.is_empty() {
            return Err(OrchestratorError::EmptyUniverse {
                task_id: task.id().clone(),
            });
        }
        info!(
            task_id = %task.id(),
            index = %index,
            count = constituents.len(),
            "expanded index into constituents"
        );

        task.resolve_symbols(constituents.clone())?;
        self.tasks.store_symbols(task.id(), &constituents).await?;
        Ok(constituents)
    }
}

/// Wires pool dispatch events back into task state.
struct RunnerHooks<T, S> {
    tasks: Arc<T>,
    results: Arc<S>,
    task_id: TaskId,
    total: u64,
}

#[async_trait]
impl<T, S> DispatchHooks for RunnerHooks<T, S>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    /// Re-check task status before each dispatch so a cancel observed here
    /// stops the queue without waiting for the pool token.
    async fn authorize_dispatch(&self, job: &Job) -> bool {
        match self.tasks.fetch_status(&self.task_id).await {
            Ok(Some(TaskStatus::Running)) => true,
            Ok(status) => {
                debug!(
                    task_id = %self.task_id,
                    symbol = %job.symbol,
                    ?status,
                    "task no longer running, halting dispatch"
                );
                false
            }
            Err(err) => {
                warn!(
                    task_id = %self.task_id,
                    error = %err,
                    "status check failed, halting dispatch"
                );
                false
            }
        }
    }

    /// Fold a finished job into the per-symbol rows and the progress
    /// counter. Only clean exits count; a failed job leaves its row at
    /// `Init` and progress where it was.
    async fn job_finished(&self, job: &Job, exit: &JobExit) {
        if !exit.success() {
            return;
        }
        if let Err(err) = self.results.mark_finished(&self.task_id, &job.symbol).await {
            warn!(
                task_id = %self.task_id,
                symbol = %job.symbol,
                error = %err,
                "failed to mark symbol finished"
            );
            return;
        }
        match self.results.count_finished(&self.task_id).await {
            Ok(count) => {
                let progress = Progress::from_counts(count, self.total);
                if let Err(err) = self.tasks.record_progress(&self.task_id, progress).await {
                    debug!(
                        task_id = %self.task_id,
                        error = %err,
                        "progress update rejected"
                    );
                }
            }
            Err(err) => {
                warn!(
                    task_id = %self.task_id,
                    error = %err,
                    "failed to count finished symbols"
                );
            }
        }
    }
}
