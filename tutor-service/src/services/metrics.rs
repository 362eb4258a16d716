//! Prometheus metrics for tutor-service.
//!
//! Provides HTTP and completion-provider metrics for observability.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Tutor request metrics
pub static TUTOR_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static TUTOR_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Provider metrics
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Calling it again is a no-op.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let tutor_requests = IntCounterVec::new(
        Opts::new("tutor_requests_total", "Total tutor requests"),
        &["mode", "phase", "outcome"],
    )
    .expect("Failed to create tutor_requests_total metric");

    let tutor_duration = HistogramVec::new(
        HistogramOpts::new(
            "tutor_request_duration_seconds",
            "End-to-end tutor request duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["mode"],
    )
    .expect("Failed to create tutor_request_duration_seconds metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "tutor_provider_latency_seconds",
            "Completion provider API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider", "model"],
    )
    .expect("Failed to create tutor_provider_latency_seconds metric");

    let provider_errors = IntCounterVec::new(
        Opts::new("tutor_provider_errors_total", "Total completion provider errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create tutor_provider_errors_total metric");

    let provider_tokens = IntCounterVec::new(
        Opts::new("tutor_provider_tokens_total", "Total tokens processed"),
        &["model", "type"], // type: input, output
    )
    .expect("Failed to create tutor_provider_tokens_total metric");

    registry
        .register(Box::new(tutor_requests.clone()))
        .expect("Failed to register tutor_requests_total");
    registry
        .register(Box::new(tutor_duration.clone()))
        .expect("Failed to register tutor_request_duration_seconds");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register tutor_provider_latency_seconds");
    registry
        .register(Box::new(provider_errors.clone()))
        .expect("Failed to register tutor_provider_errors_total");
    registry
        .register(Box::new(provider_tokens.clone()))
        .expect("Failed to register tutor_provider_tokens_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = TUTOR_REQUESTS_TOTAL.set(tutor_requests);
    let _ = TUTOR_REQUEST_DURATION_SECONDS.set(tutor_duration);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = PROVIDER_TOKENS_TOTAL.set(provider_tokens);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a finished tutor request.
pub fn record_tutor_request(mode: &str, phase: &str, outcome: &str, duration_secs: f64) {
    if let Some(counter) = TUTOR_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[mode, phase, outcome]).inc();
    }
    if let Some(histogram) = TUTOR_REQUEST_DURATION_SECONDS.get() {
        histogram.with_label_values(&[mode]).observe(duration_secs);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Record token usage.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(counter) = PROVIDER_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}
