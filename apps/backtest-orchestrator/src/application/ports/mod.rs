//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driver Ports** (Primary/Inbound): the use cases in [`super::use_cases`]
//! - **Driven Ports** (Secondary/Outbound): persistence, universe resolution,
//!   and log forwarding defined here

mod log_sink;
mod symbol_result_repository;
mod task_repository;
mod universe;

pub use log_sink::{LogLevel, LogRecord, LogSink};
pub use symbol_result_repository::SymbolResultRepository;
pub use task_repository::{CancelOutcome, RepositoryError, TaskRepository};
pub use universe::{UniverseError, UniversePort};
