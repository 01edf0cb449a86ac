//! Log Sink Port (Driven Port)
//!
//! Write-only collaborator that receives worker output line by line. The
//! production sink forwards to `tracing`; tests collect records in memory.
//! Appending is infallible by contract: a sink that cannot keep up drops
//! records rather than stalling the process pump.

use async_trait::async_trait;

use crate::domain::shared::{Symbol, TaskId};

/// Severity of a forwarded worker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Normal output (worker stdout).
    Info,
    /// Diagnostic output (worker stderr).
    Warn,
    /// Orchestrator-observed failure.
    Error,
}

impl LogLevel {
    /// Lowercase label for display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// One line of worker output with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Task the line belongs to, when known.
    pub task_id: Option<TaskId>,
    /// Symbol whose job produced the line, when known.
    pub symbol: Option<Symbol>,
    /// Severity.
    pub level: LogLevel,
    /// The line itself, newline stripped.
    pub message: String,
}

impl LogRecord {
    /// Build a record attributed to one job.
    #[must_use]
    pub fn for_job(
        task_id: Option<TaskId>,
        symbol: Symbol,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            symbol: Some(symbol),
            level,
            message: message.into(),
        }
    }
}

/// Port for forwarding worker output.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append one record.
    async fn append(&self, record: LogRecord);
}
