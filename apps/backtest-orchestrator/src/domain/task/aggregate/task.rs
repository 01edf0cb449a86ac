//! Task Aggregate Root
//!
//! A task is one backtest request: a set of symbols (or an index to expand),
//! a time window, and strategy parameters. The aggregate owns the lifecycle
//! state machine and the progress counter; per-symbol outcomes live in their
//! own rows keyed by (task, symbol).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{IndexCode, Symbol, TaskId};
use crate::domain::task::errors::TaskError;
use crate::domain::task::value_objects::{
    Progress, TaskParameters, TaskResultSummary, TaskStatus, TimeRange,
};

/// Command to create a new task.
#[derive(Debug, Clone)]
pub struct CreateTaskCommand {
    /// Explicit symbols to backtest (may be empty when `index` is set).
    pub symbols: Vec<Symbol>,
    /// Index whose constituents are resolved at run time.
    pub index: Option<IndexCode>,
    /// Backtest window.
    pub time_range: TimeRange,
    /// Strategy configuration.
    pub parameters: TaskParameters,
}

impl CreateTaskCommand {
    /// Validate the command parameters.
    ///
    /// # Errors
    ///
    /// Returns error if no symbols are addressable or any part is malformed.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.symbols.is_empty() && self.index.is_none() {
            return Err(TaskError::NoSymbols);
        }
        for symbol in &self.symbols {
            symbol.validate()?;
        }
        self.parameters.validate()?;
        Ok(())
    }
}

/// Task Aggregate Root.
///
/// State machine: `Pending -> Running -> {Completed, Failed, Cancelled}`,
/// plus `Pending -> Cancelled`. Terminal states never transition again;
/// a restart is a brand-new task with a fresh id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    status: TaskStatus,
    progress: Progress,
    symbols: Vec<Symbol>,
    index: Option<IndexCode>,
    time_range: TimeRange,
    parameters: TaskParameters,
    result_summary: Option<TaskResultSummary>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task from a command.
    ///
    /// # Errors
    ///
    /// Returns error if command validation fails.
    pub fn new(cmd: CreateTaskCommand) -> Result<Self, TaskError> {
        cmd.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: TaskId::generate(),
            status: TaskStatus::Pending,
            progress: Progress::ZERO,
            symbols: cmd.symbols,
            index: cmd.index,
            time_range: cmd.time_range,
            parameters: cmd.parameters,
            result_summary: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Clone this task's request into a fresh pending task with a new id.
    ///
    /// Used by restart: the original task keeps its terminal state, and the
    /// clone starts from the original request (index unexpanded, so the
    /// universe is re-resolved on the next run).
    #[must_use]
    pub fn clone_for_restart(&self) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            status: TaskStatus::Pending,
            progress: Progress::ZERO,
            symbols: if self.index.is_some() {
                Vec::new()
            } else {
                self.symbols.clone()
            },
            index: self.index.clone(),
            time_range: self.time_range.clone(),
            parameters: self.parameters.clone(),
            result_summary: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the task ID.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Get the progress percentage.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Get the symbols (explicit or resolved from the index).
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Get the index to expand, if any.
    #[must_use]
    pub const fn index(&self) -> Option<&IndexCode> {
        self.index.as_ref()
    }

    /// Get the backtest window.
    #[must_use]
    pub const fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    /// Get the strategy parameters.
    #[must_use]
    pub const fn parameters(&self) -> &TaskParameters {
        &self.parameters
    }

    /// Get the aggregated result summary, present once completed.
    #[must_use]
    pub const fn result_summary(&self) -> Option<&TaskResultSummary> {
        self.result_summary.as_ref()
    }

    /// Get the failure message, present once failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ========================================================================
    // State Transitions
    // ========================================================================

    /// Claim the task for execution: `Pending -> Running`.
    ///
    /// # Errors
    ///
    /// Returns error unless the task is pending.
    pub fn begin(&mut self) -> Result<(), TaskError> {
        self.transition_to(TaskStatus::Running)
    }

    /// Record resolved symbols after expanding the index.
    ///
    /// # Errors
    ///
    /// Returns error if the list is empty, any symbol is malformed, or the
    /// task is already terminal.
    pub fn resolve_symbols(&mut self, symbols: Vec<Symbol>) -> Result<(), TaskError> {
        if self.status.is_terminal() {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to: self.status,
            });
        }
        if symbols.is_empty() {
            return Err(TaskError::NoSymbols);
        }
        for symbol in &symbols {
            symbol.validate()?;
        }
        self.symbols = symbols;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record forward progress while running.
    ///
    /// Progress never decreases and is clamped below 100 until the task
    /// completes; `complete` is the only way to reach 100.
    ///
    /// # Errors
    ///
    /// Returns error if the task is not running.
    pub fn record_progress(&mut self, progress: Progress) -> Result<(), TaskError> {
        if self.status != TaskStatus::Running {
            return Err(TaskError::ProgressWhileNotRunning {
                status: self.status,
            });
        }
        let next = progress.capped();
        if next > self.progress {
            self.progress = next;
            self.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Finish successfully: `Running -> Completed`, progress pinned to 100.
    ///
    /// # Errors
    ///
    /// Returns error unless the task is running.
    pub fn complete(&mut self, summary: TaskResultSummary) -> Result<(), TaskError> {
        self.transition_to(TaskStatus::Completed)?;
        self.progress = Progress::COMPLETE;
        self.result_summary = Some(summary);
        Ok(())
    }

    /// Finish with an error: `Running -> Failed`.
    ///
    /// # Errors
    ///
    /// Returns error unless the task is running.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TaskError> {
        self.transition_to(TaskStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Cancel the task.
    ///
    /// Idempotent: cancelling an already-cancelled task is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the task already completed or failed.
    pub fn cancel(&mut self) -> Result<(), TaskError> {
        if self.status == TaskStatus::Cancelled {
            return Ok(());
        }
        self.transition_to(TaskStatus::Cancelled)
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    fn transition_to(&mut self, target: TaskStatus) -> Result<(), TaskError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}
