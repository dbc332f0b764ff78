//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Items processed per stage (success/failure, duration, retries)
//! - Pool occupancy
//! - Bytes fetched and written

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts};

// =============================================================================
// Item Metrics
// =============================================================================

/// Items finished total by stage and result.
pub static ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("spritefetch_items_total", "Total items that reached a terminal state"),
        &["stage", "result"], // result: "success", "failed"
    )
    .unwrap()
});

/// Per-item duration in seconds, retries included.
pub static ITEM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "spritefetch_item_duration_seconds",
            "Duration of one item including retries",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["stage"],
    )
    .unwrap()
});

/// Retry attempts total by stage.
pub static RETRY_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("spritefetch_retry_attempts_total", "Total item retry attempts"),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Pool Metrics
// =============================================================================

/// Invocations currently holding a pool slot.
pub static ITEMS_IN_FLIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "spritefetch_items_in_flight",
            "Number of worker invocations currently running",
        ),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Payload Metrics
// =============================================================================

/// Bytes downloaded from the remote host.
pub static BYTES_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("spritefetch_bytes_fetched_total", "Total payload bytes fetched").unwrap()
});

/// Bytes written by the transform stage.
pub static BYTES_TRANSFORMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "spritefetch_bytes_transformed_total",
        "Total bytes of derived images written",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ITEMS_TOTAL.clone()),
        Box::new(ITEM_DURATION.clone()),
        Box::new(RETRY_ATTEMPTS.clone()),
        Box::new(ITEMS_IN_FLIGHT.clone()),
        Box::new(BYTES_FETCHED.clone()),
        Box::new(BYTES_TRANSFORMED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        ITEMS_TOTAL.with_label_values(&["fetch", "success"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"spritefetch_items_total".to_string()));
    }
}
