//! Prometheus registry for the binary.
//!
//! The core crate owns the metric definitions; this module only registers
//! them and renders the text exposition after a run.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};
use std::path::Path;
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in spritefetch_core::metrics::all_metrics() {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
    registry
});

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not UTF-8")
}

/// Writes the exposition to `path`.
pub fn export_metrics(path: &Path) -> Result<()> {
    let text = encode_metrics()?;
    std::fs::write(path, text).with_context(|| format!("Failed to write metrics to {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_metrics() {
        spritefetch_core::metrics::BYTES_FETCHED.inc_by(3);
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("metrics.prom");

        export_metrics(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("spritefetch_bytes_fetched_total"));
    }
}
