// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Backtest Orchestrator - Rust Core Library
//!
//! Concurrent backtest-task orchestration for the Quantbench trading system.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! The orchestrator follows Clean Architecture principles with Domain-Driven
//! Design:
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects)
//!   - `task`: Task aggregate, status lifecycle, per-symbol result rows
//!   - `shared`: Identifiers and value objects shared across contexts
//!
//! - **Application**: Use cases and ports
//!   - `ports`: Interfaces for external systems (`TaskRepository`,
//!     `SymbolResultRepository`, `UniversePort`, `LogSink`)
//!   - `use_cases`: `SubmitTask`, `CancelTask`, `RestartTask`, `GetTask`
//!
//! - **Orchestrator**: Long-running execution core
//!   - `scheduler`: Polls for pending tasks, spawns a detached runner each
//!   - `runner`: Drives one task end to end
//!   - `pool`: Bounded worker pool with cooperative cancellation
//!   - `process`: Subprocess spawn, wait, and process-tree termination
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: Task and symbol-result stores
//!   - `universe`: Index constituent lookup
//!   - `logging`: Worker output sinks
//!   - `http`: REST API controllers
//!   - `config`: Environment-driven settings

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Orchestration core - scheduler, runner, worker pool, process control.
pub mod orchestrator;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::shared::{ExecutionMode, IndexCode, Symbol, TaskId};
pub use domain::task::{
    CreateTaskCommand, Progress, SymbolMetrics, SymbolResult, Task, TaskError, TaskParameters,
    TaskResultSummary, TaskStatus, TimeRange,
};

// Application re-exports
pub use application::ports::{
    CancelOutcome, LogLevel, LogRecord, LogSink, RepositoryError, SymbolResultRepository,
    TaskRepository, UniverseError, UniversePort,
};
pub use application::use_cases::{
    CancelReport, CancelTaskUseCase, GetTaskUseCase, RestartTaskUseCase, SubmitTaskError,
    SubmitTaskUseCase, TaskDetails,
};

// Orchestration re-exports
pub use orchestrator::{
    OrchestratorConfig, PoolRegistry, ProcessRunner, TaskRunner, TaskScheduler, WorkerCommand,
    WorkerPool,
};

// Infrastructure re-exports
pub use infrastructure::config::{ConfigError, Settings};
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::logging::TracingLogSink;
pub use infrastructure::persistence::{InMemorySymbolResultRepository, InMemoryTaskRepository};
pub use infrastructure::universe::StaticUniverse;
