//! Value objects owned by the task aggregate.

pub mod parameters;
pub mod progress;
pub mod result_summary;
pub mod symbol_result;
pub mod task_status;
pub mod time_range;

pub use parameters::TaskParameters;
pub use progress::Progress;
pub use result_summary::TaskResultSummary;
pub use symbol_result::{SymbolMetrics, SymbolResult, SymbolResultStatus};
pub use task_status::TaskStatus;
pub use time_range::TimeRange;
