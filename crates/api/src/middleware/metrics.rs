use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder. Must be called once at startup
/// before any metric is emitted.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])
        .expect("invalid histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        panic!("metrics recorder initialized twice");
    }
}

/// Renders the Prometheus exposition text.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Metrics not initialized",
        )
            .into_response(),
    }
}

/// Records request count and latency per route. Uses the matched route
/// template rather than the raw path to keep label cardinality bounded.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().as_str().to_string();

    let started = Instant::now();
    let response = next.run(req).await;
    let elapsed = started.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status,
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
    )
    .record(elapsed);

    response
}

pub fn record_order_created() {
    counter!("orders_created_total").increment(1);
}

pub fn record_status_change() {
    counter!("order_status_changes_total").increment(1);
}

pub fn record_message_posted() {
    counter!("chat_messages_posted_total").increment(1);
}

pub fn record_attachment_outcome(uploaded: bool) {
    let outcome = if uploaded { "uploaded" } else { "failed" };
    counter!("chat_attachments_total", "outcome" => outcome).increment(1);
}

pub fn record_notifications_fanned_out(kind: &str, count: u64) {
    if count > 0 {
        counter!("notifications_created_total", "kind" => kind.to_string()).increment(count);
    }
}

pub fn record_file_uploaded(category: &str) {
    counter!("order_files_uploaded_total", "category" => category.to_string()).increment(1);
}

pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("logins_total", "outcome" => outcome).increment(1);
}
