//! Aggregated result summary stored on a completed task.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::symbol_result::SymbolResult;

/// Cross-symbol averages computed when every job of a task has finished.
///
/// Averages are taken over the rows that actually carry metrics; a worker
/// that finishes without reporting any (e.g. no trades in the window) counts
/// toward `total_count` but not the means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultSummary {
    /// Number of finished symbol rows.
    pub total_count: u64,
    /// Mean profit and loss ratio across reporting symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_pnl_ratio: Option<Decimal>,
    /// Mean Sharpe ratio across reporting symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_sharp_ratio: Option<Decimal>,
    /// Mean maximum drawdown across reporting symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_max_drawdown: Option<Decimal>,
    /// Mean win ratio across reporting symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_win_ratio: Option<Decimal>,
    /// When the aggregation ran.
    pub completed_at: DateTime<Utc>,
    /// Explanation when there was nothing to aggregate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskResultSummary {
    /// Aggregate finished symbol rows into cross-symbol averages.
    #[must_use]
    pub fn aggregate(results: &[SymbolResult]) -> Self {
        let metrics: Vec<_> = results.iter().filter_map(|r| r.metrics.as_ref()).collect();
        if metrics.is_empty() {
            return Self::empty(results.len() as u64, "no symbol reported metrics");
        }

        let n = Decimal::from(metrics.len() as u64);
        let mut pnl = Decimal::ZERO;
        let mut sharp = Decimal::ZERO;
        let mut drawdown = Decimal::ZERO;
        let mut win = Decimal::ZERO;
        for m in &metrics {
            pnl += m.pnl_ratio;
            sharp += m.sharp_ratio;
            drawdown += m.max_drawdown;
            win += m.win_ratio;
        }

        Self {
            total_count: results.len() as u64,
            avg_pnl_ratio: Some(pnl / n),
            avg_sharp_ratio: Some(sharp / n),
            avg_max_drawdown: Some(drawdown / n),
            avg_win_ratio: Some(win / n),
            completed_at: Utc::now(),
            message: None,
        }
    }

    /// Summary for a task whose symbols produced no metrics at all.
    #[must_use]
    pub fn empty(total_count: u64, message: impl Into<String>) -> Self {
        Self {
            total_count,
            avg_pnl_ratio: None,
            avg_sharp_ratio: None,
            avg_max_drawdown: None,
            avg_win_ratio: None,
            completed_at: Utc::now(),
            message: Some(message.into()),
        }
    }
}
