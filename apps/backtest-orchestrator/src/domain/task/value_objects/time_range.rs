//! Backtest time range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::task::errors::TaskError;

/// Format used for `--start_time`/`--end_time` on the worker command line.
const WORKER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Half-open time window a task simulates over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a validated range.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidTimeRange`] unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TaskError> {
        if start >= end {
            return Err(TaskError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range start.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Range end.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Start formatted for the worker command line.
    #[must_use]
    pub fn start_arg(&self) -> String {
        self.start.format(WORKER_TIME_FORMAT).to_string()
    }

    /// End formatted for the worker command line.
    #[must_use]
    pub fn end_arg(&self) -> String {
        self.end.format(WORKER_TIME_FORMAT).to_string()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_arg(), self.end_arg())
    }
}
