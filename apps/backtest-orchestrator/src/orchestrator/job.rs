//! Job construction: one symbol, one worker invocation.

use std::path::PathBuf;

use crate::domain::shared::{Symbol, TaskId};
use crate::domain::task::value_objects::{TaskParameters, TimeRange};

use super::config::WorkerCommand;

/// A fully resolved command line for one worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable to launch.
    pub program: String,
    /// Complete argument vector.
    pub args: Vec<String>,
    /// Extra environment merged over the parent's.
    pub envs: Vec<(String, String)>,
    /// Working directory, parent's when `None`.
    pub workdir: Option<PathBuf>,
}

impl CommandSpec {
    /// One-line rendering for logs.
    #[must_use]
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// The smallest unit of work: one backtest of one symbol.
#[derive(Debug, Clone)]
pub struct Job {
    /// Task this job belongs to, absent for standalone invocations.
    pub task_id: Option<TaskId>,
    /// Symbol under test.
    pub symbol: Symbol,
    /// Worker invocation.
    pub command: CommandSpec,
}

impl Job {
    /// Build the job for one symbol of a task.
    ///
    /// The per-job arguments follow the worker contract in this exact order:
    /// `--symbol`, `--start_time`, `--end_time`, `--strategy_name`, `--mode`,
    /// then `--task_id` when the job belongs to a task. They are appended
    /// after the configured base arguments.
    #[must_use]
    pub fn build(
        worker: &WorkerCommand,
        task_id: Option<TaskId>,
        symbol: Symbol,
        time_range: &TimeRange,
        parameters: &TaskParameters,
    ) -> Self {
        let mut args = worker.base_args.clone();
        args.push(format!("--symbol={}", symbol.as_str()));
        args.push(format!("--start_time={}", time_range.start_arg()));
        args.push(format!("--end_time={}", time_range.end_arg()));
        args.push(format!("--strategy_name={}", parameters.strategy_name));
        args.push(format!("--mode={}", parameters.mode.as_str()));
        if let Some(id) = &task_id {
            args.push(format!("--task_id={}", id.as_str()));
        }

        Self {
            task_id,
            symbol,
            command: CommandSpec {
                program: worker.program.clone(),
                args,
                envs: worker.envs.clone(),
                workdir: worker.workdir.clone(),
            },
        }
    }
}
