//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use axum::{Router, routing::get};
use lazy_static::lazy_static;
use prometheus::{Counter, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("cliptide_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("cliptide_errors_total", "Total number of errors returned"),
        &["error_type", "endpoint"]
    ).expect("metric can be created");

    // Database Metrics
    pub static ref DB_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("cliptide_db_queries_total", "Total number of database queries"),
        &["operation", "table"]
    ).expect("metric can be created");

    // Storage Metrics
    pub static ref MEDIA_UPLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("cliptide_media_uploads_total", "Total number of media uploads"),
        &["kind"]
    ).expect("metric can be created");
    pub static ref MEDIA_BYTES_UPLOADED: Counter = Counter::new(
        "cliptide_media_bytes_uploaded_total",
        "Total bytes of media uploaded"
    ).expect("metric can be created");
    pub static ref MEDIA_DELETES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("cliptide_media_deletes_total", "Total number of remote media deletions"),
        &["status"]
    ).expect("metric can be created");

    // Application Metrics
    pub static ref USERS_REGISTERED_TOTAL: IntCounter = IntCounter::new(
        "cliptide_users_registered_total",
        "Total number of user registrations"
    ).expect("metric can be created");
    pub static ref VIDEOS_PUBLISHED_TOTAL: IntCounter = IntCounter::new(
        "cliptide_videos_published_total",
        "Total number of videos published"
    ).expect("metric can be created");
}

/// Register all instruments with the global registry.
///
/// Safe to call once at startup; duplicate registration is reported
/// and ignored rather than treated as fatal.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(ERRORS_TOTAL.clone()),
        Box::new(DB_QUERIES_TOTAL.clone()),
        Box::new(MEDIA_UPLOADS_TOTAL.clone()),
        Box::new(MEDIA_BYTES_UPLOADED.clone()),
        Box::new(MEDIA_DELETES_TOTAL.clone()),
        Box::new(USERS_REGISTERED_TOTAL.clone()),
        Box::new(VIDEOS_PUBLISHED_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(error) = REGISTRY.register(collector) {
            tracing::debug!(%error, "metric already registered");
        }
    }
}

/// Router exposing the Prometheus text endpoint.
pub fn metrics_router() -> Router {
    Router::new().route("/metrics", get(serve_metrics))
}

async fn serve_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
