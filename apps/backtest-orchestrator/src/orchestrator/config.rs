//! Configuration for the orchestration core.

use std::path::PathBuf;
use std::time::Duration;

/// The external worker command a job is launched as.
///
/// The orchestrator appends the per-job arguments (`--symbol=...` and
/// friends) after `base_args`, so `program` + `base_args` is everything
/// needed to reach the vendor engine entrypoint.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    /// Executable to launch.
    pub program: String,
    /// Arguments placed before the per-job arguments.
    pub base_args: Vec<String>,
    /// Extra environment variables merged over the parent environment.
    pub envs: Vec<(String, String)>,
    /// Working directory for the worker, parent's when `None`.
    pub workdir: Option<PathBuf>,
}

impl WorkerCommand {
    /// A worker launched as a bare program with no extra arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            envs: Vec::new(),
            workdir: None,
        }
    }
}

/// Configuration for the orchestration core.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum concurrently running jobs per task.
    pub worker_capacity: usize,

    /// How often the scheduler polls for pending tasks.
    pub poll_interval: Duration,

    /// How long a terminated process group gets between SIGTERM and SIGKILL.
    pub termination_grace: Duration,

    /// The worker command jobs are launched as.
    pub worker: WorkerCommand,
}

impl OrchestratorConfig {
    /// Default per-task job concurrency.
    pub const DEFAULT_WORKER_CAPACITY: usize = 4;
    /// Default scheduler poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
    /// Default SIGTERM-to-SIGKILL grace period.
    pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_secs(3);
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            worker_capacity: Self::DEFAULT_WORKER_CAPACITY,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            termination_grace: Self::DEFAULT_TERMINATION_GRACE,
            worker: WorkerCommand::new("backtest-worker"),
        }
    }
}
