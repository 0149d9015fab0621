//! Prometheus metrics for the unhash server.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry no digests or tokens, only aggregate counts. Restrict the
//! endpoint to scraper networks at the infrastructure level, or disable it
//! with `server.metrics_enabled = false`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Object metrics
pub static OBJECTS_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "unhash_objects_created_total",
        "Total number of objects newly stored",
    )
    .expect("metric creation failed")
});

pub static OBJECTS_DEDUPLICATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "unhash_objects_deduplicated_total",
        "Total number of uploads that matched an existing object",
    )
    .expect("metric creation failed")
});

pub static BYTES_STORED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "unhash_bytes_stored_total",
        "Total bytes of newly stored objects",
    )
    .expect("metric creation failed")
});

pub static INGEST_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "unhash_ingest_failures_total",
        "Total number of uploads aborted during ingestion",
    )
    .expect("metric creation failed")
});

pub static OBJECTS_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "unhash_objects_served_total",
        "Total number of objects returned to readers",
    )
    .expect("metric creation failed")
});

// Payment metrics
pub static QUOTES_ISSUED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("unhash_quotes_issued_total", "Total number of price quotes issued")
        .expect("metric creation failed")
});

pub static PAYMENTS_REJECTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "unhash_payments_rejected_total",
        "Total number of uploads rejected by the payment gate",
    )
    .expect("metric creation failed")
});

// Timing metrics
pub static UPLOAD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "unhash_upload_duration_seconds",
            "Time taken to ingest and commit an upload",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so routers built repeatedly in tests can call it freely.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(OBJECTS_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(OBJECTS_DEDUPLICATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_STORED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(INGEST_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(OBJECTS_SERVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(QUOTES_ISSUED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PAYMENTS_REJECTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOAD_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        register_metrics();
        register_metrics();
        QUOTES_ISSUED.inc();

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&REGISTRY.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("unhash_quotes_issued_total"));
    }
}
