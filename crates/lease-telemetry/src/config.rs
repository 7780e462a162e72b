//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive.
    pub log_level: String,

    /// Whether to enable console output.
    pub console_output: bool,

    /// Whether to emit JSON formatted logs.
    pub json_logs: bool,

    /// Deployment environment (dev, staging, production).
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "lease-sign".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            environment: "dev".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LS_SERVICE_NAME`: Service name (default: lease-sign)
    /// - `LS_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `LS_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `LS_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `LS_ENVIRONMENT`: Deployment environment (default: dev)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("LS_SERVICE_NAME").unwrap_or_else(|_| "lease-sign".to_string()),

            log_level: env::var("LS_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("LS_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("LS_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            environment: env::var("LS_ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()),
        }
    }

    /// Override the log level, e.g. from a `--verbose` flag.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Service name qualified by environment, unless running in dev.
    pub fn full_service_name(&self) -> String {
        if self.environment == "dev" {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.environment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "lease-sign");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_with_log_level() {
        let config = TelemetryConfig::default().with_log_level("debug");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_full_service_name() {
        let mut config = TelemetryConfig::default();
        assert_eq!(config.full_service_name(), "lease-sign");

        config.environment = "production".to_string();
        assert_eq!(config.full_service_name(), "lease-sign-production");
    }
}
