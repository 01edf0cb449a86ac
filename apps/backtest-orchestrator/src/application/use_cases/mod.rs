//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod cancel_task;
mod get_task;
mod restart_task;
mod submit_task;

pub use cancel_task::{CancelReport, CancelTaskUseCase};
pub use get_task::{GetTaskUseCase, TaskDetails};
pub use restart_task::RestartTaskUseCase;
pub use submit_task::{SubmitTaskError, SubmitTaskUseCase};
