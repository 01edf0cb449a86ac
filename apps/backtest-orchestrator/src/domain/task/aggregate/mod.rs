//! Task Aggregate
//!
//! The Task aggregate is the root entity for backtest lifecycle management.

mod task;

pub use task::{CreateTaskCommand, Task};
