//! Execution mode for backtest worker invocations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mode passed to the worker process via `--mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Historical simulation against recorded market data.
    #[default]
    Backtest,
    /// Live trading against a real market session.
    Live,
}

impl ExecutionMode {
    /// Parse mode from string. Unknown values fall back to backtest,
    /// never to live.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "live" => Self::Live,
            _ => Self::Backtest,
        }
    }

    /// Check if this is the live mode.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Wire value used on the worker command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Backtest => "backtest",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
