//! Bounded worker pool: FIFO dispatch, cancellation, tree teardown.
//!
//! One pool serves one task run. A semaphore caps how many jobs hold a
//! worker slot at once; a cancellation token is the pool's monotonic
//! cancelled flag; the active registry maps live process groups so a cancel
//! can tear every in-flight tree down.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::shared::{Symbol, TaskId};

use super::job::Job;
use super::process::{JobExit, ProcessHandle, ProcessRunner};

/// Dispatch-time collaborators supplied by the pool's caller.
///
/// Both methods default to no-ops so standalone pool use needs no hooks.
#[async_trait]
pub trait DispatchHooks: Send + Sync {
    /// Last check before a job takes its slot. Returning `false` halts
    /// dispatch and discards the rest of the queue; jobs already in flight
    /// are left to finish.
    async fn authorize_dispatch(&self, job: &Job) -> bool {
        let _ = job;
        true
    }

    /// Called once per dispatched job after its process has been reaped.
    async fn job_finished(&self, job: &Job, exit: &JobExit) {
        let _ = (job, exit);
    }
}

/// Hooks that authorize everything and observe nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

#[async_trait]
impl DispatchHooks for NoHooks {}

/// Accounting for one full pool run.
#[derive(Debug, Clone, Default)]
pub struct PoolRunReport {
    /// Jobs handed to a worker slot.
    pub dispatched: u64,
    /// Jobs whose worker exited zero.
    pub completed: u64,
    /// Jobs whose worker exited non-zero or died to a signal.
    pub failed: u64,
    /// Jobs dispatched but abandoned by cancellation before running.
    pub skipped: u64,
    /// Jobs whose worker never launched, with the spawn error.
    pub launch_failures: Vec<(Symbol, String)>,
    /// Whether cancellation cut the queue short.
    pub cancelled: bool,
    /// Whether a dispatch authorization halt cut the queue short.
    pub halted: bool,
}

impl PoolRunReport {
    /// First launch failure, if any job never started.
    #[must_use]
    pub fn first_launch_error(&self) -> Option<&(Symbol, String)> {
        self.launch_failures.first()
    }
}

/// Private per-worker outcome, folded into the report at drain time.
enum WorkerOutcome {
    Completed,
    Failed,
    Skipped,
    LaunchFailed { symbol: Symbol, message: String },
}

/// Bounded pool executing one task's jobs.
pub struct WorkerPool {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    cancelled: CancellationToken,
    active: Arc<Mutex<HashMap<i32, ProcessHandle>>>,
    process_runner: Arc<ProcessRunner>,
}

impl WorkerPool {
    /// Create a pool running at most `capacity` jobs at once.
    ///
    /// A zero capacity is clamped to one.
    #[must_use]
    pub fn new(capacity: usize, process_runner: Arc<ProcessRunner>) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            cancelled: CancellationToken::new(),
            active: Arc::new(Mutex::new(HashMap::new())),
            process_runner,
        }
    }

    /// The concurrency cap.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live worker processes right now. Never exceeds capacity.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Whether the pool has been cancelled. Monotonic.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_cancelled()
    }

    /// Run jobs front to back, at most `capacity` at a time.
    ///
    /// Returns only after every dispatched worker has fully finished, so the
    /// active registry is empty and each dispatched job has reported exactly
    /// one outcome by the time the report is handed back.
    pub async fn run(&self, jobs: Vec<Job>, hooks: Arc<dyn DispatchHooks>) -> PoolRunReport {
        let total = jobs.len();
        let mut join_set: JoinSet<WorkerOutcome> = JoinSet::new();
        let mut dispatched: u64 = 0;
        let mut halted = false;

        info!(total, capacity = self.capacity, "dispatching jobs");

        for job in jobs {
            // Slot acquisition is bounded by cancellation so a full pool
            // never blocks a cancel from cutting the queue.
            let permit = tokio::select! {
                () = self.cancelled.cancelled() => None,
                permit = Arc::clone(&self.semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else { break };
            if self.cancelled.is_cancelled() {
                drop(permit);
                break;
            }

            if !hooks.authorize_dispatch(&job).await {
                debug!(
                    symbol = %job.symbol,
                    "dispatch not authorized, discarding remaining queue"
                );
                drop(permit);
                halted = true;
                break;
            }

            dispatched += 1;
            let worker = WorkerContext {
                cancelled: self.cancelled.clone(),
                active: Arc::clone(&self.active),
                process_runner: Arc::clone(&self.process_runner),
                hooks: Arc::clone(&hooks),
            };
            join_set.spawn(async move { worker.execute(job, permit).await });
        }

        let mut report = PoolRunReport {
            dispatched,
            halted,
            ..PoolRunReport::default()
        };
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(WorkerOutcome::Completed) => report.completed += 1,
                Ok(WorkerOutcome::Failed) => report.failed += 1,
                Ok(WorkerOutcome::Skipped) => report.skipped += 1,
                Ok(WorkerOutcome::LaunchFailed { symbol, message }) => {
                    report.launch_failures.push((symbol, message));
                }
                Err(err) => {
                    error!(error = %err, "worker task panicked");
                    report.failed += 1;
                }
            }
        }
        report.cancelled = self.cancelled.is_cancelled();

        info!(
            dispatched = report.dispatched,
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            launch_failures = report.launch_failures.len(),
            cancelled = report.cancelled,
            halted = report.halted,
            "pool drained"
        );
        report
    }

    /// Cancel the pool: stop dispatching and terminate every in-flight tree.
    ///
    /// Idempotent. The token flips before the registry walk, and workers
    /// re-check it while registering, so no process enters the registry
    /// after this point.
    pub async fn cancel(&self) {
        if self.cancelled.is_cancelled() {
            debug!("pool already cancelled");
            return;
        }
        self.cancelled.cancel();

        let handles: Vec<ProcessHandle> = self.active.lock().values().cloned().collect();
        info!(
            in_flight = handles.len(),
            "pool cancelled, terminating in-flight process trees"
        );
        for handle in handles {
            self.process_runner.terminate_tree(&handle).await;
        }
    }
}

/// Live pools keyed by task, shared between runners and the cancel path.
///
/// A runner registers its pool for exactly the duration of its run, so a
/// lookup hit means the task has workers that a cancel must reach.
#[derive(Clone, Default)]
pub struct PoolRegistry {
    pools: Arc<Mutex<HashMap<TaskId, Arc<WorkerPool>>>>,
}

impl PoolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task's pool for the duration of its run.
    pub fn register(&self, task_id: TaskId, pool: Arc<WorkerPool>) {
        self.pools.lock().insert(task_id, pool);
    }

    /// Drop a task's pool once its run has finished.
    pub fn remove(&self, task_id: &TaskId) {
        self.pools.lock().remove(task_id);
    }

    /// Pool for a task, if its run is live right now.
    #[must_use]
    pub fn get(&self, task_id: &TaskId) -> Option<Arc<WorkerPool>> {
        self.pools.lock().get(task_id).cloned()
    }

    /// Number of live runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.lock().len()
    }

    /// Whether no run is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.lock().is_empty()
    }
}

/// Everything one worker task needs, moved into its future.
struct WorkerContext {
    cancelled: CancellationToken,
    active: Arc<Mutex<HashMap<i32, ProcessHandle>>>,
    process_runner: Arc<ProcessRunner>,
    hooks: Arc<dyn DispatchHooks>,
}

impl WorkerContext {
    async fn execute(self, job: Job, permit: OwnedSemaphorePermit) -> WorkerOutcome {
        // Held for the worker's whole life; dropping frees the slot on
        // every exit path.
        let _permit = permit;

        if self.cancelled.is_cancelled() {
            return WorkerOutcome::Skipped;
        }

        let spawned = match self.process_runner.start(&job) {
            Ok(spawned) => spawned,
            Err(err) => {
                warn!(symbol = %job.symbol, error = %err, "job launch failed");
                return WorkerOutcome::LaunchFailed {
                    symbol: job.symbol.clone(),
                    message: err.to_string(),
                };
            }
        };
        let handle = spawned.handle.clone();

        // Registration and the cancellation check are one atomic step: a
        // pool cancelled before this line never gains a new active entry.
        let registered = {
            let mut active = self.active.lock();
            if self.cancelled.is_cancelled() {
                false
            } else {
                active.insert(handle.pid, handle.clone());
                true
            }
        };

        if !registered {
            // Cancelled while spawning. The registry walk cannot see this
            // process, so the worker tears it down itself.
            self.process_runner.terminate_tree(&handle).await;
            let _ = self.process_runner.wait(spawned).await;
            return WorkerOutcome::Skipped;
        }

        let waited = self.process_runner.wait(spawned).await;
        self.active.lock().remove(&handle.pid);

        match waited {
            Ok(exit) => {
                self.hooks.job_finished(&job, &exit).await;
                if exit.success() {
                    WorkerOutcome::Completed
                } else {
                    warn!(symbol = %job.symbol, code = ?exit.code, "job exited non-zero");
                    WorkerOutcome::Failed
                }
            }
            Err(err) => {
                error!(symbol = %job.symbol, error = %err, "failed waiting for job");
                WorkerOutcome::Failed
            }
        }
    }
}
