//! Orchestrator Configuration Settings
//!
//! Configuration types for the orchestrator service, loaded from environment
//! variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::orchestrator::{OrchestratorConfig, WorkerCommand};

/// HTTP server bind settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: String,
    /// Port for the REST API.
    pub port: u16,
}

impl ServerSettings {
    /// The bind address as `host:port`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Complete orchestrator service configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Orchestration core settings.
    pub orchestrator: OrchestratorConfig,
}

impl Settings {
    /// Create configuration from environment variables.
    ///
    /// `ORCHESTRATOR_WORKER_PROGRAM` is required; everything else falls back
    /// to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let program = std::env::var("ORCHESTRATOR_WORKER_PROGRAM")
            .map_err(|_| ConfigError::MissingEnvVar("ORCHESTRATOR_WORKER_PROGRAM".to_string()))?;

        if program.is_empty() {
            return Err(ConfigError::EmptyValue(
                "ORCHESTRATOR_WORKER_PROGRAM".to_string(),
            ));
        }

        let base_args = std::env::var("ORCHESTRATOR_WORKER_ARGS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let workdir = std::env::var("ORCHESTRATOR_WORKER_DIR")
            .ok()
            .map(PathBuf::from);

        let worker = WorkerCommand {
            program,
            base_args,
            envs: Vec::new(),
            workdir,
        };

        let orchestrator = OrchestratorConfig {
            worker_capacity: parse_env_usize(
                "ORCHESTRATOR_WORKER_CAPACITY",
                OrchestratorConfig::DEFAULT_WORKER_CAPACITY,
            ),
            poll_interval: parse_env_duration_secs(
                "ORCHESTRATOR_POLL_INTERVAL_SECS",
                OrchestratorConfig::DEFAULT_POLL_INTERVAL,
            ),
            termination_grace: parse_env_duration_secs(
                "ORCHESTRATOR_TERMINATION_GRACE_SECS",
                OrchestratorConfig::DEFAULT_TERMINATION_GRACE,
            ),
            worker,
        };

        let server = ServerSettings {
            host: std::env::var("ORCHESTRATOR_HTTP_HOST")
                .unwrap_or_else(|_| ServerSettings::default().host),
            port: parse_env_u16("ORCHESTRATOR_HTTP_PORT", ServerSettings::default().port),
        };

        Ok(Self {
            server,
            orchestrator,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_settings_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn parse_helpers_fall_back_when_unset() {
        // Keyed on variables the test harness never sets.
        assert_eq!(parse_env_u16("ORCH_TEST_UNSET_PORT", 9090), 9090);
        assert_eq!(parse_env_usize("ORCH_TEST_UNSET_CAP", 7), 7);
        assert_eq!(
            parse_env_duration_secs("ORCH_TEST_UNSET_SECS", Duration::from_secs(5)),
            Duration::from_secs(5)
        );
    }
}
