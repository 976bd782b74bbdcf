//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ticketdesk server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Ticket lifecycle counters (created, closed, deleted, errors)
//! - Stored ticket count (collected on scrape)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketdesk_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketdesk_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketdesk_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Ticket Metrics
// =============================================================================

/// Tickets currently stored (collected on scrape).
pub static TICKETS_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("ticketdesk_tickets", "Current number of stored tickets").unwrap()
});

/// Tickets created total.
pub static TICKETS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ticketdesk_tickets_created_total",
        "Total tickets created since startup",
    )
    .unwrap()
});

/// Tickets closed total.
pub static TICKETS_CLOSED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ticketdesk_tickets_closed_total",
        "Total tickets closed since startup",
    )
    .unwrap()
});

/// Tickets deleted, by mode ("single", "bulk").
pub static TICKETS_DELETED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_tickets_deleted_total",
            "Total tickets deleted since startup",
        ),
        &["mode"],
    )
    .unwrap()
});

/// Rejected or failed ticket operations, by error kind.
pub static TICKET_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_ticket_errors_total",
            "Ticket operations that returned an error",
        ),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Tickets
    registry.register(Box::new(TICKETS_TOTAL.clone())).unwrap();
    registry
        .register(Box::new(TICKETS_CREATED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(TICKETS_CLOSED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(TICKETS_DELETED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(TICKET_ERRORS_TOTAL.clone()))
        .unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh gauges from the store before a scrape.
pub fn collect_dynamic_metrics(state: &AppState) {
    match state.tickets().count() {
        Ok(count) => TICKETS_TOTAL.set(count),
        Err(e) => warn!("Failed to collect ticket count: {}", e),
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    static UUID_REGEX: Lazy<regex_lite::Regex> = Lazy::new(|| {
        regex_lite::Regex::new(
            r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        )
        .unwrap()
    });

    UUID_REGEX.replace_all(path, "{id}").into_owned()
}
