//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure
//! dependencies. This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Errors**: Violations of aggregate invariants
//!
//! # Bounded Contexts
//!
//! - [`task`]: Backtest task lifecycle and per-symbol results
//! - [`shared`]: Identifiers and primitives used across contexts

pub mod shared;
pub mod task;
