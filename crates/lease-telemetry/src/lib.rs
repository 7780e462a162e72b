//! # Lease Telemetry
//!
//! Logging and metrics bootstrap for the lease-signature runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lease_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LS_SERVICE_NAME` | `lease-sign` | Service name in logs |
//! | `LS_LOG_LEVEL` | `info` | Log level filter |
//! | `LS_JSON_LOGS` | `false` | JSON log lines |
//! | `LS_ENVIRONMENT` | `dev` | Deployment environment |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::encode_metrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    #[error("Failed to encode metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging. Returns a guard to hold for the process lifetime.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(&config)?;
    Ok(TelemetryGuard {
        service_name: config.full_service_name(),
    })
}

/// Guard that keeps telemetry active. Logs the shutdown on drop.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
