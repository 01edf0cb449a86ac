//! Configuration Module
//!
//! Configuration loading for the orchestrator service.

mod settings;

pub use settings::{ConfigError, ServerSettings, Settings};
