//! Task lifecycle status.
//!
//! The lifecycle is `pending -> running -> {completed, failed, cancelled}`,
//! with `pending -> cancelled` reachable when a cancellation request races
//! ahead of the scheduler. Terminal states are never left; restarting a
//! task always means submitting a brand-new task id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a backtest task in the datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Submitted, waiting to be claimed by the scheduler.
    Pending,
    /// Claimed; per-symbol jobs are dispatching or in flight.
    Running,
    /// All jobs drained and results aggregated.
    Completed,
    /// An unrecoverable error surfaced during execution.
    Failed,
    /// Cancelled by an external request; a normal terminal state, not a
    /// failure.
    Cancelled,
}

impl TaskStatus {
    /// Check if this status is terminal (no further transitions).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if the task is still owned by the orchestrator.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// Check if a cancellation request can still take effect.
    #[must_use]
    pub const fn is_cancelable(&self) -> bool {
        self.is_active()
    }

    /// Check whether the lifecycle permits moving to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Cancelled)
                | (
                    Self::Running,
                    Self::Completed | Self::Failed | Self::Cancelled
                )
        )
    }

    /// Lowercase name as stored and logged.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
