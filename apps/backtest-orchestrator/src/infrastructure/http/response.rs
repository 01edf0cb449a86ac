//! HTTP response DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::use_cases::TaskDetails;
use crate::domain::shared::ExecutionMode;
use crate::domain::task::{Task, TaskResultSummary, TaskStatus};

/// Response from task submission and restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskResponse {
    /// Identifier assigned to the task.
    pub task_id: String,
    /// Status right after submission (always pending).
    pub status: TaskStatus,
}

impl SubmitTaskResponse {
    /// Build from a freshly stored task.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id().to_string(),
            status: task.status(),
        }
    }
}

/// Full task view returned by `GET /api/v1/tasks/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task identifier.
    pub task_id: String,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Progress percentage, 0 to 100.
    pub progress: u8,
    /// Symbols the task runs over. Empty until an index task resolves.
    pub symbols: Vec<String>,
    /// Index reference, if the task was submitted with one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// Backtest window start.
    pub start_time: DateTime<Utc>,
    /// Backtest window end.
    pub end_time: DateTime<Utc>,
    /// Strategy name.
    pub strategy_name: String,
    /// Backtest or live session.
    pub mode: ExecutionMode,
    /// Symbol rows already finished.
    pub finished_count: u64,
    /// Symbol rows in total; zero until an index task resolves.
    pub total_count: u64,
    /// Cross-symbol averages, present once the task completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<ResultSummaryResponse>,
    /// Failure description, present once the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Last state change.
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    /// Build from the task plus its finished-row count.
    #[must_use]
    pub fn from_details(details: &TaskDetails) -> Self {
        let task = &details.task;
        Self {
            task_id: task.id().to_string(),
            status: task.status(),
            progress: task.progress().value(),
            symbols: task.symbols().iter().map(ToString::to_string).collect(),
            index: task.index().map(ToString::to_string),
            start_time: task.time_range().start(),
            end_time: task.time_range().end(),
            strategy_name: task.parameters().strategy_name.clone(),
            mode: task.parameters().mode,
            finished_count: details.finished_count,
            total_count: task.symbols().len() as u64,
            result_summary: task.result_summary().map(ResultSummaryResponse::from_summary),
            error_message: task.error_message().map(ToString::to_string),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Cross-symbol averages in the task view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummaryResponse {
    /// Number of finished symbol rows.
    pub total_count: u64,
    /// Average profit-and-loss ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_pnl_ratio: Option<Decimal>,
    /// Average Sharpe ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_sharp_ratio: Option<Decimal>,
    /// Average maximum drawdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_max_drawdown: Option<Decimal>,
    /// Average win ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_win_ratio: Option<Decimal>,
    /// When the aggregation ran.
    pub completed_at: DateTime<Utc>,
    /// Note set when no symbol reported metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResultSummaryResponse {
    /// Build from the domain summary.
    #[must_use]
    pub fn from_summary(summary: &TaskResultSummary) -> Self {
        Self {
            total_count: summary.total_count,
            avg_pnl_ratio: summary.avg_pnl_ratio,
            avg_sharp_ratio: summary.avg_sharp_ratio,
            avg_max_drawdown: summary.avg_max_drawdown,
            avg_win_ratio: summary.avg_win_ratio,
            completed_at: summary.completed_at,
            message: summary.message.clone(),
        }
    }
}

/// Response from task cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTaskResponse {
    /// Task identifier.
    pub task_id: String,
    /// Status after the cancel request.
    pub status: TaskStatus,
    /// Whether a live worker pool was told to stop.
    pub pool_notified: bool,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}
