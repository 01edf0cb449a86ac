//! Infrastructure Layer
//!
//! This module contains all adapters (implementations) for the ports defined
//! in the application layer. Following hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**: Implement ports for external systems
//!   - `persistence/`: Task and symbol-result stores
//!   - `universe/`: Index constituent lookup
//!   - `logging/`: Worker output sinks
//!
//! - **Driver Adapters (Inbound)**: Expose application to external world
//!   - `http/`: REST API controllers
//!
//! - **Configuration**: Cross-cutting service wiring
//!   - `config/`: Environment-driven settings

pub mod config;
pub mod http;
pub mod logging;
pub mod persistence;
pub mod universe;
