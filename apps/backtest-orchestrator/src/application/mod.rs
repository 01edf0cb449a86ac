//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces the orchestrator needs from the outside world
//! - **Use Cases**: The control surface (submit, cancel, restart, query)

pub mod ports;
pub mod use_cases;

pub use ports::*;
pub use use_cases::*;
