//! # Metrics
//!
//! Prometheus metrics for monitoring the updater.
//!
//! ## Metrics Exposed
//!
//! - `argocd_update_passes_total` - Total number of reconciliation passes
//! - `argocd_update_pass_duration_seconds` - Duration of reconciliation passes
//! - `argocd_update_syncs_initiated_total` - Total number of syncs initiated
//! - `argocd_update_errors_total` - Total number of pass errors by kind
//! - `argocd_update_step_results_total` - Total number of step results by status

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static PASSES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "argocd_update_passes_total",
        "Total number of reconciliation passes",
    )
    .expect("Failed to create PASSES_TOTAL metric - this should never happen")
});

static PASS_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "argocd_update_pass_duration_seconds",
            "Duration of reconciliation passes in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
    )
    .expect("Failed to create PASS_DURATION metric - this should never happen")
});

static SYNCS_INITIATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "argocd_update_syncs_initiated_total",
        "Total number of Argo CD syncs initiated",
    )
    .expect("Failed to create SYNCS_INITIATED_TOTAL metric - this should never happen")
});

static ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "argocd_update_errors_total",
            "Total number of pass errors by error kind",
        ),
        &["kind"],
    )
    .expect("Failed to create ERRORS_TOTAL metric - this should never happen")
});

static STEP_RESULTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "argocd_update_step_results_total",
            "Total number of step results by status",
        ),
        &["status"],
    )
    .expect("Failed to create STEP_RESULTS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(PASSES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PASS_DURATION.clone()))?;
    REGISTRY.register(Box::new(SYNCS_INITIATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STEP_RESULTS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_passes() {
    PASSES_TOTAL.inc();
}

pub fn observe_pass_duration(duration: f64) {
    PASS_DURATION.observe(duration);
}

pub fn increment_syncs_initiated() {
    SYNCS_INITIATED_TOTAL.inc();
}

/// Increment the errors counter for the given error kind
pub fn increment_errors(kind: &str) {
    ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_step_results(status: &str) {
    STEP_RESULTS_TOTAL.with_label_values(&[status]).inc();
}

/// Render all registered metrics in the Prometheus text format
///
/// # Errors
///
/// Returns an error if the metrics cannot be encoded.
pub fn gather_text() -> Result<String> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = SYNCS_INITIATED_TOTAL.get();
        increment_syncs_initiated();
        assert!(SYNCS_INITIATED_TOTAL.get() > before);

        increment_errors("fetch");
        assert!(ERRORS_TOTAL.with_label_values(&["fetch"]).get() >= 1);
    }
}
