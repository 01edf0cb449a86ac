//! Subprocess lifecycle: spawn, stream output, reap, terminate trees.
//!
//! Each job runs as one OS process leading its own process group, so the
//! whole tree a worker forks can be signalled together. This layer carries
//! no concurrency policy; the pool decides how many of these run at once.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::ports::{LogLevel, LogRecord, LogSink};
use crate::domain::shared::{Symbol, TaskId};

use super::job::Job;

/// How often the terminated group is probed for exit during the grace period.
const TERMINATION_PROBE_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from the subprocess layer.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The worker binary could not be launched at all.
    #[error("failed to launch {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// OS error description.
        message: String,
    },

    /// Waiting on the child failed.
    #[error("failed waiting for worker: {message}")]
    Wait {
        /// OS error description.
        message: String,
    },
}

/// Identity of a live job process, enough to signal its whole tree.
///
/// With every child spawned into its own process group, `pid` doubles as the
/// process group id.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    /// Process id (== process group id).
    pub pid: i32,
    /// Task the process belongs to, when any.
    pub task_id: Option<TaskId>,
    /// Symbol the process is backtesting.
    pub symbol: Symbol,
}

/// A launched job: the child plus its signalling handle.
///
/// The child is private so [`ProcessRunner::wait`] is the only consumer;
/// everyone else interacts through the cloneable handle.
pub struct SpawnedJob {
    child: Child,
    /// Signalling identity, cloneable into the active registry.
    pub handle: ProcessHandle,
}

/// Observed end of a job process.
///
/// A non-zero code is an ordinary outcome here, not an error: the worker
/// owns the meaning of its exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobExit {
    /// Exit code, `None` when the process died to a signal.
    pub code: Option<i32>,
}

impl JobExit {
    /// Whether the worker exited cleanly.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Spawns worker processes, pumps their output, and tears down trees.
pub struct ProcessRunner {
    log_sink: Arc<dyn LogSink>,
    termination_grace: Duration,
}

impl ProcessRunner {
    /// Create a runner forwarding worker output to `log_sink`, giving
    /// terminated trees `termination_grace` between SIGTERM and SIGKILL.
    #[must_use]
    pub fn new(log_sink: Arc<dyn LogSink>, termination_grace: Duration) -> Self {
        Self {
            log_sink,
            termination_grace,
        }
    }

    /// Launch the job's worker process.
    ///
    /// The child gets piped stdout/stderr, its own process group, and
    /// kill-on-drop as a last-resort leak guard.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] when the OS refuses to start the
    /// program; this is the synchronous launch-failure path.
    pub fn start(&self, job: &Job) -> Result<SpawnedJob, ProcessError> {
        let spec = &job.command;
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &spec.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &spec.workdir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|err| ProcessError::Spawn {
            program: spec.program.clone(),
            message: err.to_string(),
        })?;

        let Some(pid) = child.id() else {
            return Err(ProcessError::Spawn {
                program: spec.program.clone(),
                message: "child exited before a pid could be read".to_string(),
            });
        };

        debug!(
            pid,
            task_id = ?job.task_id,
            symbol = %job.symbol,
            command = %spec.display_line(),
            "worker launched"
        );

        Ok(SpawnedJob {
            child,
            handle: ProcessHandle {
                pid: pid as i32,
                task_id: job.task_id.clone(),
                symbol: job.symbol.clone(),
            },
        })
    }

    /// Stream the worker's output to the log sink until it exits, then reap.
    ///
    /// stdout lines are forwarded at info, stderr at warn. Returns the exit
    /// code as data; only an OS-level wait failure is an error.
    pub async fn wait(&self, spawned: SpawnedJob) -> Result<JobExit, ProcessError> {
        let SpawnedJob { mut child, handle } = spawned;

        let stdout_pump = child.stdout.take().map(|out| {
            tokio::spawn(pump_lines(
                Arc::clone(&self.log_sink),
                handle.task_id.clone(),
                handle.symbol.clone(),
                LogLevel::Info,
                out,
            ))
        });
        let stderr_pump = child.stderr.take().map(|err| {
            tokio::spawn(pump_lines(
                Arc::clone(&self.log_sink),
                handle.task_id.clone(),
                handle.symbol.clone(),
                LogLevel::Warn,
                err,
            ))
        });

        let status = child.wait().await.map_err(|err| ProcessError::Wait {
            message: err.to_string(),
        })?;

        // Both pumps end at pipe EOF; join them so no line is lost.
        if let Some(pump) = stdout_pump {
            let _ = pump.await;
        }
        if let Some(pump) = stderr_pump {
            let _ = pump.await;
        }

        let exit = JobExit {
            code: status.code(),
        };
        debug!(
            pid = handle.pid,
            task_id = ?handle.task_id,
            symbol = %handle.symbol,
            code = ?exit.code,
            "worker exited"
        );
        Ok(exit)
    }

    /// Terminate the process group behind a handle.
    ///
    /// SIGTERM first; if the group is still alive when the grace period
    /// runs out, SIGKILL. An already-gone group is not an error.
    #[cfg(unix)]
    pub async fn terminate_tree(&self, handle: &ProcessHandle) {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(handle.pid);

        match killpg(pgid, Signal::SIGTERM) {
            Ok(()) => {
                info!(
                    pid = handle.pid,
                    task_id = ?handle.task_id,
                    symbol = %handle.symbol,
                    "sent SIGTERM to process group"
                );
            }
            Err(Errno::ESRCH) => {
                debug!(pid = handle.pid, "process group already gone");
                return;
            }
            Err(err) => {
                warn!(pid = handle.pid, error = %err, "SIGTERM delivery failed");
            }
        }

        let deadline = Instant::now() + self.termination_grace;
        while Instant::now() < deadline {
            tokio::time::sleep(TERMINATION_PROBE_INTERVAL).await;
            match killpg(pgid, None) {
                Ok(()) => {}
                Err(Errno::ESRCH) => {
                    debug!(pid = handle.pid, "process group exited within grace period");
                    return;
                }
                Err(err) => {
                    warn!(pid = handle.pid, error = %err, "process group probe failed");
                    break;
                }
            }
        }

        info!(
            pid = handle.pid,
            task_id = ?handle.task_id,
            symbol = %handle.symbol,
            "grace period expired, escalating to SIGKILL"
        );
        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(err) => {
                warn!(pid = handle.pid, error = %err, "SIGKILL delivery failed");
            }
        }
    }

    /// Terminate the process group behind a handle.
    #[cfg(not(unix))]
    pub async fn terminate_tree(&self, handle: &ProcessHandle) {
        warn!(
            pid = handle.pid,
            "process tree termination is only supported on unix"
        );
    }
}

/// Forward one output stream to the sink, line by line, until EOF.
async fn pump_lines<R>(
    sink: Arc<dyn LogSink>,
    task_id: Option<TaskId>,
    symbol: Symbol,
    level: LogLevel,
    stream: R,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        sink.append(LogRecord::for_job(
            task_id.clone(),
            symbol.clone(),
            level,
            line,
        ))
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::job::CommandSpec;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<LogRecord>>,
    }

    impl RecordingSink {
        fn messages(&self, level: LogLevel) -> Vec<String> {
            self.records
                .lock()
                .iter()
                .filter(|r| r.level == level)
                .map(|r| r.message.clone())
                .collect()
        }
    }

    #[async_trait]
    impl LogSink for RecordingSink {
        async fn append(&self, record: LogRecord) {
            self.records.lock().push(record);
        }
    }

    fn sh_job(script: &str) -> Job {
        Job {
            task_id: Some(TaskId::new("task-1")),
            symbol: Symbol::new("SHSE.600000"),
            command: CommandSpec {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string()],
                envs: vec![],
                workdir: None,
            },
        }
    }

    fn runner_with_sink() -> (ProcessRunner, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let runner = ProcessRunner::new(sink.clone(), Duration::from_millis(500));
        (runner, sink)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn start_and_wait_forwards_stdout() {
        let (runner, sink) = runner_with_sink();

        let spawned = runner.start(&sh_job("echo hello")).unwrap();
        let exit = runner.wait(spawned).await.unwrap();

        assert!(exit.success());
        assert_eq!(sink.messages(LogLevel::Info), vec!["hello".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stderr_is_forwarded_at_warn() {
        let (runner, sink) = runner_with_sink();

        let spawned = runner.start(&sh_job("echo oops 1>&2")).unwrap();
        let exit = runner.wait(spawned).await.unwrap();

        assert!(exit.success());
        assert_eq!(sink.messages(LogLevel::Warn), vec!["oops".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn workdir_applies_to_the_child() {
        let (runner, sink) = runner_with_sink();
        let dir = tempfile::tempdir().unwrap();
        let mut job = sh_job("pwd");
        job.command.workdir = Some(dir.path().to_path_buf());

        let spawned = runner.start(&job).unwrap();
        let exit = runner.wait(spawned).await.unwrap();

        assert!(exit.success());
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            sink.messages(LogLevel::Info),
            vec![expected.display().to_string()]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_data_not_error() {
        let (runner, _sink) = runner_with_sink();

        let spawned = runner.start(&sh_job("exit 3")).unwrap();
        let exit = runner.wait(spawned).await.unwrap();

        assert_eq!(exit.code, Some(3));
        assert!(!exit.success());
    }

    #[tokio::test]
    async fn spawn_failure_is_synchronous() {
        let (runner, _sink) = runner_with_sink();
        let mut job = sh_job("true");
        job.command.program = "/nonexistent/backtest-worker-missing".to_string();

        let result = runner.start(&job);
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_tree_kills_sleeping_group() {
        let (runner, _sink) = runner_with_sink();

        let spawned = runner.start(&sh_job("sleep 30")).unwrap();
        let handle = spawned.handle.clone();

        let started = std::time::Instant::now();
        runner.terminate_tree(&handle).await;
        let exit = runner.wait(spawned).await.unwrap();

        // Signal-killed: no exit code, and nowhere near the sleep duration.
        assert_eq!(exit.code, None);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_tree_tolerates_dead_group() {
        let (runner, _sink) = runner_with_sink();

        let spawned = runner.start(&sh_job("true")).unwrap();
        let handle = spawned.handle.clone();
        let _ = runner.wait(spawned).await.unwrap();

        // Group is fully reaped; signalling it again must be a no-op.
        runner.terminate_tree(&handle).await;
    }
}
