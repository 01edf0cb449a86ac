//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod execution_mode;
mod identifiers;
mod symbol;

pub use execution_mode::ExecutionMode;
pub use identifiers::{IndexCode, TaskId};
pub use symbol::Symbol;
