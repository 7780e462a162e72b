//! Prometheus exposition.
//!
//! Subsystem crates register their own metrics on the default registry
//! (`register_*!` macros); this module renders whatever is registered.

use prometheus::{Encoder, TextEncoder};

use crate::TelemetryError;

/// Encode all metrics of the default registry in Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::register_int_counter;

    #[test]
    fn test_encode_includes_registered_counter() {
        let counter = register_int_counter!(
            "lease_telemetry_test_total",
            "Counter registered by the telemetry test"
        )
        .unwrap();
        counter.inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("lease_telemetry_test_total 1"));
    }
}
