//! Task progress value object.
//!
//! Progress is an integer percentage. While a task runs it climbs with the
//! number of finished symbols but never reaches 100 from counting alone;
//! the exact value 100 is written only by the completion transition.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::task::errors::TaskError;

/// Highest value progress can reach while a task is still running.
pub const MAX_WHILE_RUNNING: u8 = 99;

/// Percentage of a task's symbols that have produced a result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    /// Progress of a freshly claimed task.
    pub const ZERO: Self = Self(0);

    /// Progress of a completed task.
    pub const COMPLETE: Self = Self(100);

    /// Create a progress value, rejecting anything above 100.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::ProgressOutOfRange`] for values above 100.
    pub fn try_new(value: u8) -> Result<Self, TaskError> {
        if value > 100 {
            return Err(TaskError::ProgressOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Progress derived from finished/total symbol counts, capped at 99.
    ///
    /// A zero total yields zero progress.
    #[must_use]
    pub const fn from_counts(finished: u64, total: u64) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let pct = finished.saturating_mul(100) / total;
        if pct > MAX_WHILE_RUNNING as u64 {
            Self(MAX_WHILE_RUNNING)
        } else {
            Self(pct as u8)
        }
    }

    /// The percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Check whether this is the completion value.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.0 == 100
    }

    /// Clamp to the running-phase ceiling of 99.
    #[must_use]
    pub const fn capped(self) -> Self {
        if self.0 > MAX_WHILE_RUNNING {
            Self(MAX_WHILE_RUNNING)
        } else {
            self
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
