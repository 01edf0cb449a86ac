//! Per-symbol result rows produced while a task runs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Symbol, TaskId};

/// Lifecycle of a single symbol's backtest inside a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolResultStatus {
    /// Row created, job not finished yet.
    Init,
    /// Job exited cleanly and metrics (if any) are recorded.
    Finished,
}

impl SymbolResultStatus {
    /// Whether the symbol's job has completed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Lowercase label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for SymbolResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Performance metrics reported for one symbol's backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMetrics {
    /// Cumulative profit and loss ratio.
    #[serde(with = "rust_decimal::serde::str")]
    pub pnl_ratio: Decimal,
    /// Annualized Sharpe ratio.
    #[serde(with = "rust_decimal::serde::str")]
    pub sharp_ratio: Decimal,
    /// Maximum drawdown over the window.
    #[serde(with = "rust_decimal::serde::str")]
    pub max_drawdown: Decimal,
    /// Fraction of winning trades.
    #[serde(with = "rust_decimal::serde::str")]
    pub win_ratio: Decimal,
}

/// One row per (task, symbol): status plus metrics once finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolResult {
    /// Owning task.
    pub task_id: TaskId,
    /// Symbol this row tracks.
    pub symbol: Symbol,
    /// Row lifecycle status.
    pub status: SymbolResultStatus,
    /// Metrics recorded by the worker, absent until finished.
    pub metrics: Option<SymbolMetrics>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl SymbolResult {
    /// Create the initial row for a symbol before its job is dispatched.
    #[must_use]
    pub fn init(task_id: TaskId, symbol: Symbol) -> Self {
        Self {
            task_id,
            symbol,
            status: SymbolResultStatus::Init,
            metrics: None,
            updated_at: Utc::now(),
        }
    }

    /// Mark the row finished, keeping whatever metrics the worker stored.
    pub fn finish(&mut self, metrics: Option<SymbolMetrics>) {
        self.status = SymbolResultStatus::Finished;
        if metrics.is_some() {
            self.metrics = metrics;
        }
        self.updated_at = Utc::now();
    }
}
