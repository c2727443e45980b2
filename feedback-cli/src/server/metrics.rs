use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::MatchedPath;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// All application metrics
pub struct Metrics {
    // Store operations
    pub submissions_total: IntCounterVec,
    pub deletes_total: IntCounterVec,
    pub submissions_stored: IntGauge,

    // Auth gate
    pub auth_denied: IntCounter,

    // HTTP request metrics
    pub http_requests_total: IntCounterVec,
    pub http_request_duration: HistogramVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    fn new(registry: &Registry) -> Self {
        // ── Store operations ─────────────────────────────────────────
        let submissions_total = IntCounterVec::new(
            Opts::new("feedback_submissions_total", "Feedback submissions by result"),
            &["result"],
        )
        .expect("failed to create submissions_total metric");

        let deletes_total = IntCounterVec::new(
            Opts::new("feedback_deletes_total", "Submission deletions by result"),
            &["result"],
        )
        .expect("failed to create deletes_total metric");

        let submissions_stored = IntGauge::new(
            "feedback_submissions_stored",
            "Number of stored submissions at the last admin listing",
        )
        .expect("failed to create submissions_stored metric");

        // ── Auth gate ────────────────────────────────────────────────
        let auth_denied = IntCounter::new(
            "feedback_auth_denied_total",
            "Admin requests rejected by the auth gate",
        )
        .expect("failed to create auth_denied metric");

        // ── HTTP request metrics ──────────────────────────────────────
        let http_requests_total = IntCounterVec::new(
            Opts::new("feedback_http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("failed to create http_requests_total metric");

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "feedback_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["method", "path"],
        )
        .expect("failed to create http_request_duration metric");

        // Register all metrics with the registry
        registry.register(Box::new(submissions_total.clone())).expect("register submissions_total");
        registry.register(Box::new(deletes_total.clone())).expect("register deletes_total");
        registry.register(Box::new(submissions_stored.clone())).expect("register submissions_stored");
        registry.register(Box::new(auth_denied.clone())).expect("register auth_denied");
        registry.register(Box::new(http_requests_total.clone())).expect("register http_requests_total");
        registry.register(Box::new(http_request_duration.clone())).expect("register http_request_duration");

        Self {
            submissions_total,
            deletes_total,
            submissions_stored,
            auth_denied,
            http_requests_total,
            http_request_duration,
        }
    }
}

/// Get the global metrics instance, initializing on first call
pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let registry = REGISTRY.get_or_init(Registry::new);
        Metrics::new(registry)
    })
}

/// Axum handler for GET /metrics — returns Prometheus text format
pub async fn handle_metrics() -> Response {
    // Ensure all metric collectors are registered on first call.
    let _ = metrics();
    let registry = REGISTRY.get_or_init(Registry::new);
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Axum middleware that records HTTP request count and duration.
pub async fn track_metrics(request: Request<axum::body::Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let m = metrics();
    m.http_requests_total
        .with_label_values(&[&method, &path, &status])
        .inc();
    m.http_request_duration
        .with_label_values(&[&method, &path])
        .observe(elapsed);

    response
}
