//! Metrics collection for garmin-service.
//!
//! HTTP request metrics come from the shared middleware through the
//! `metrics` recorder; Garmin client outcomes live in a Prometheus registry.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static GARMIN_CLIENT_CALLS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize metrics collection. Calling it again is a no-op.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!("Failed to install Prometheus recorder: {}", e),
        }
    }

    if PROMETHEUS_REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();
    let calls_counter = match IntCounterVec::new(
        Opts::new(
            "garmin_client_calls_total",
            "Total Garmin session library calls by operation and status",
        ),
        &["operation", "status"],
    ) {
        Ok(counter) => counter,
        Err(e) => {
            tracing::warn!("Failed to create garmin_client_calls_total metric: {}", e);
            return;
        }
    };

    if let Err(e) = registry.register(Box::new(calls_counter.clone())) {
        tracing::warn!("Failed to register garmin_client_calls_total: {}", e);
        return;
    }

    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = GARMIN_CLIENT_CALLS_TOTAL.set(calls_counter);
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Record the outcome of one Garmin client call.
pub fn record_garmin_call(operation: &str, status: &str) {
    if let Some(counter) = GARMIN_CLIENT_CALLS_TOTAL.get() {
        counter.with_label_values(&[operation, status]).inc();
    }
}
