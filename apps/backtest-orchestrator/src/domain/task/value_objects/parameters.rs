//! Task parameters passed through to every job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::shared::ExecutionMode;
use crate::domain::task::errors::TaskError;

/// Strategy configuration carried by a task.
///
/// Only `strategy_name` and `mode` are interpreted here (both end up on the
/// worker command line); everything else is opaque strategy configuration
/// forwarded unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskParameters {
    /// Strategy the worker should run (e.g. "MACD_STRATEGY").
    pub strategy_name: String,
    /// Backtest or live session.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Strategy-specific knobs, passed through untouched.
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl TaskParameters {
    /// Create parameters for a strategy.
    #[must_use]
    pub fn new(strategy_name: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            mode,
            extra: Map::new(),
        }
    }

    /// Attach an opaque strategy knob.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Validate the parts this orchestrator interprets.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::EmptyStrategyName`] when no strategy is named.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.strategy_name.trim().is_empty() {
            return Err(TaskError::EmptyStrategyName);
        }
        Ok(())
    }
}
