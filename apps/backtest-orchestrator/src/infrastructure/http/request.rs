//! HTTP request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::shared::{ExecutionMode, IndexCode, Symbol};
use crate::domain::task::{CreateTaskCommand, TaskError, TaskParameters, TimeRange};

/// Request to submit a backtest task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskRequest {
    /// Symbols to backtest. May be empty when `index` is given.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Index to expand into constituents at run time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// Backtest window start.
    pub start_time: DateTime<Utc>,
    /// Backtest window end.
    pub end_time: DateTime<Utc>,
    /// Strategy the workers should run.
    pub strategy_name: String,
    /// Backtest or live session.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Strategy-specific knobs, forwarded to workers untouched.
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl SubmitTaskRequest {
    /// Convert into the application-layer command.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidTimeRange`] when the window is inverted
    /// or empty.
    pub fn into_command(self) -> Result<CreateTaskCommand, TaskError> {
        let time_range = TimeRange::new(self.start_time, self.end_time)?;
        Ok(CreateTaskCommand {
            symbols: self.symbols.into_iter().map(Symbol::new).collect(),
            index: self.index.map(IndexCode::new),
            time_range,
            parameters: TaskParameters {
                strategy_name: self.strategy_name,
                mode: self.mode,
                extra: self.extra,
            },
        })
    }
}
