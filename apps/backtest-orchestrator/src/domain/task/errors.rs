//! Task domain errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::value_objects::TaskStatus;

/// Errors raised by the task aggregate and its value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The requested status transition is not allowed by the lifecycle.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Status before the attempted transition.
        from: TaskStatus,
        /// Status the transition attempted to reach.
        to: TaskStatus,
    },

    /// Task was submitted without any way to resolve a symbol set.
    #[error("task must carry at least one symbol or an index reference")]
    NoSymbols,

    /// Task parameters are missing a strategy name.
    #[error("strategy name cannot be empty")]
    EmptyStrategyName,

    /// A symbol failed validation.
    #[error("invalid symbol {value:?}: {message}")]
    InvalidSymbol {
        /// The offending symbol string.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    /// Time range bounds are inverted or degenerate.
    #[error("invalid time range: start {start} is not before end {end}")]
    InvalidTimeRange {
        /// Range start.
        start: DateTime<Utc>,
        /// Range end.
        end: DateTime<Utc>,
    },

    /// Progress value outside 0-100.
    #[error("progress {value} exceeds 100")]
    ProgressOutOfRange {
        /// The rejected value.
        value: u8,
    },

    /// Progress was recorded while the task is not running.
    #[error("cannot record progress while task is {status}")]
    ProgressWhileNotRunning {
        /// Current task status.
        status: TaskStatus,
    },
}
