//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to application use cases.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::application::ports::{
    CancelOutcome, RepositoryError, SymbolResultRepository, TaskRepository,
};
use crate::application::use_cases::{
    CancelTaskUseCase, GetTaskUseCase, RestartTaskUseCase, SubmitTaskError, SubmitTaskUseCase,
};
use crate::domain::shared::TaskId;
use crate::domain::task::TaskStatus;

use super::request::SubmitTaskRequest;
use super::response::{
    ApiErrorResponse, CancelTaskResponse, HealthResponse, SubmitTaskResponse, TaskResponse,
};

/// Application state shared across handlers.
pub struct AppState<T, S>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    /// Use case for submitting tasks.
    pub submit_task: Arc<SubmitTaskUseCase<T>>,
    /// Use case for cancelling tasks and their live runs.
    pub cancel_task: Arc<CancelTaskUseCase<T>>,
    /// Use case for cloning a task into a fresh pending one.
    pub restart_task: Arc<RestartTaskUseCase<T>>,
    /// Use case for reading a task's state.
    pub get_task: Arc<GetTaskUseCase<T, S>>,
    /// Application version.
    pub version: String,
}

impl<T, S> Clone for AppState<T, S>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    fn clone(&self) -> Self {
        Self {
            submit_task: Arc::clone(&self.submit_task),
            cancel_task: Arc::clone(&self.cancel_task),
            restart_task: Arc::clone(&self.restart_task),
            get_task: Arc::clone(&self.get_task),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<T, S>(state: AppState<T, S>) -> Router
where
    T: TaskRepository + 'static,
    S: SymbolResultRepository + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/tasks", post(submit_task))
        .route("/api/v1/tasks/{task_id}", get(get_task))
        .route("/api/v1/tasks/{task_id}/cancel", post(cancel_task))
        .route("/api/v1/tasks/{task_id}/restart", post(restart_task))
        .with_state(state)
}

/// Error mapped onto an HTTP status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// The request itself is malformed or fails validation.
    pub fn bad_request(message: impl ToString) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
            message.to_string(),
        )
    }

    /// The referenced task does not exist.
    pub fn not_found(message: impl ToString) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message.to_string())
    }

    /// The request lost to the task's current state.
    pub fn conflict(message: impl ToString) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message.to_string())
    }

    /// Storage or other backend failure.
    pub fn internal(message: impl ToString) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            message.to_string(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match &err {
            RepositoryError::TaskNotFound { .. } => Self::not_found(err),
            RepositoryError::DuplicateTask { .. } | RepositoryError::Conflict { .. } => {
                Self::conflict(err)
            }
            RepositoryError::Storage { .. } => Self::internal(err),
        }
    }
}

impl From<SubmitTaskError> for ApiError {
    fn from(err: SubmitTaskError) -> Self {
        match err {
            SubmitTaskError::Validation(inner) => Self::bad_request(inner),
            SubmitTaskError::Repository(inner) => Self::from(inner),
        }
    }
}

/// Health check endpoint.
async fn health_check<T, S>(State(state): State<AppState<T, S>>) -> impl IntoResponse
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Submit a new backtest task.
async fn submit_task<T, S>(
    State(state): State<AppState<T, S>>,
    Json(request): Json<SubmitTaskRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    let command = request.into_command().map_err(ApiError::bad_request)?;
    let task = state.submit_task.submit(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitTaskResponse::from_task(&task)),
    ))
}

/// Read one task with its finished-row count.
async fn get_task<T, S>(
    State(state): State<AppState<T, S>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    let task_id = TaskId::new(task_id);
    let details = state.get_task.get(&task_id).await?;
    Ok(Json(TaskResponse::from_details(&details)))
}

/// Cancel a task, stopping its worker pool when one is live.
async fn cancel_task<T, S>(
    State(state): State<AppState<T, S>>,
    Path(task_id): Path<String>,
) -> Result<Json<CancelTaskResponse>, ApiError>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    let task_id = TaskId::new(task_id);
    let report = state.cancel_task.cancel(&task_id).await?;

    if report.outcome == CancelOutcome::AlreadyTerminal {
        return Err(ApiError::conflict(format!(
            "task {task_id} already finished; nothing to cancel"
        )));
    }

    Ok(Json(CancelTaskResponse {
        task_id: task_id.to_string(),
        status: TaskStatus::Cancelled,
        pool_notified: report.pool_notified,
    }))
}

/// Clone a task into a fresh pending one.
async fn restart_task<T, S>(
    State(state): State<AppState<T, S>>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    T: TaskRepository,
    S: SymbolResultRepository,
{
    let task_id = TaskId::new(task_id);
    let clone = state.restart_task.restart(&task_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitTaskResponse::from_task(&clone)),
    ))
}
