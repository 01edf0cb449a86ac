//! Task Bounded Context
//!
//! Owns the backtest task lifecycle: submission, claiming, progress,
//! completion, failure, and cancellation, plus the per-symbol result rows it
//! fans out into.
//!
//! # Key Concepts
//!
//! - **Task Aggregate**: One backtest request and its state machine
//! - **Symbol Results**: One row per (task, symbol), flipped as jobs finish
//! - **Result Summary**: Cross-symbol averages computed on completion

pub mod aggregate;
pub mod errors;
pub mod value_objects;

pub use aggregate::{CreateTaskCommand, Task};
pub use errors::TaskError;
pub use value_objects::{
    Progress, SymbolMetrics, SymbolResult, SymbolResultStatus, TaskParameters, TaskResultSummary,
    TaskStatus, TimeRange,
};
