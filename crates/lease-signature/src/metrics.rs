//! # Signature Metrics
//!
//! Prometheus metrics for the signature workflow.
//!
//! ## Usage
//!
//! Enabled by default through the `metrics` feature:
//! ```toml
//! lease-signature = { path = "...", default-features = false }  # disable
//! ```
//!
//! ## Metrics Exported
//!
//! - `lease_signatures_recorded_total{role}` - signatures persisted
//! - `lease_signature_refusals_total{reason}` - authorization refusals
//! - `lease_sign_failures_total{class}` - failed sign requests by error class
//! - `lease_notification_failures_total{kind}` - events the notifier rejected
//! - `lease_fully_signed_total` - leases that reached fully signed
//! - `lease_status_anomalies_total{anomaly}` - inconsistent signer sets seen
//! - `lease_sign_duration_seconds` - end-to-end sign latency

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref SIGNATURES_RECORDED: IntCounterVec = register_int_counter_vec!(
        "lease_signatures_recorded_total",
        "Total number of signatures persisted",
        &["role"]
    )
    .expect("Failed to create SIGNATURES_RECORDED metric");

    pub static ref SIGNATURE_REFUSALS: IntCounterVec = register_int_counter_vec!(
        "lease_signature_refusals_total",
        "Total number of sign requests refused by the rights resolver",
        &["reason"]
    )
    .expect("Failed to create SIGNATURE_REFUSALS metric");

    pub static ref SIGN_FAILURES: IntCounterVec = register_int_counter_vec!(
        "lease_sign_failures_total",
        "Total number of failed sign requests",
        &["class"]
    )
    .expect("Failed to create SIGN_FAILURES metric");

    pub static ref NOTIFICATION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "lease_notification_failures_total",
        "Total number of milestone events the notifier failed to accept",
        &["kind"]
    )
    .expect("Failed to create NOTIFICATION_FAILURES metric");

    pub static ref LEASES_FULLY_SIGNED: IntCounter = register_int_counter!(
        "lease_fully_signed_total",
        "Total number of leases that became fully signed"
    )
    .expect("Failed to create LEASES_FULLY_SIGNED metric");

    pub static ref STATUS_ANOMALIES: IntCounterVec = register_int_counter_vec!(
        "lease_status_anomalies_total",
        "Inconsistent signer sets observed during status computation",
        &["anomaly"]
    )
    .expect("Failed to create STATUS_ANOMALIES metric");

    pub static ref SIGN_DURATION: Histogram = register_histogram!(
        "lease_sign_duration_seconds",
        "Time taken to process a sign request in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create SIGN_DURATION metric");
}

#[cfg(feature = "metrics")]
pub fn record_signature(role: &str) {
    SIGNATURES_RECORDED.with_label_values(&[role]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_refusal(reason: &str) {
    SIGNATURE_REFUSALS.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_sign_failure(class: &str) {
    SIGN_FAILURES.with_label_values(&[class]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_notification_failure(kind: &str) {
    NOTIFICATION_FAILURES.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_fully_signed() {
    LEASES_FULLY_SIGNED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_status_anomaly(anomaly: &str) {
    STATUS_ANOMALIES.with_label_values(&[anomaly]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_sign_duration(seconds: f64) {
    SIGN_DURATION.observe(seconds);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_signature(_role: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_refusal(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_sign_failure(_class: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_notification_failure(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_fully_signed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_status_anomaly(_anomaly: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_sign_duration(_seconds: f64) {}
