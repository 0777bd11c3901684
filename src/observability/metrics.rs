//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_requests_duration_seconds` (histogram): latency distribution
//! - `db_requests_total` (counter): store lookups by method and result
//! - `db_requests_latency` (histogram): store lookup latency
//! - `lifecycle_health` (gauge): 1 while the process reports healthy
//! - `lifecycle_shutdown_initiated_total` (counter): shutdowns by trigger
//! - `lifecycle_shutdown_completed_total` (counter): shutdowns by clean/unclean
//!
//! # Design Decisions
//! - One Prometheus recorder per process, rendered by the admin sidecar
//! - Every series carries the service name and version as global labels

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::ServiceConfig;

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

const EXPONENTIAL_SECONDS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the process-wide Prometheus recorder, or return the one already installed.
pub fn install_recorder(service: &ServiceConfig) -> PrometheusHandle {
    RECORDER
        .get_or_init(|| {
            let builder = PrometheusBuilder::new()
                .set_buckets(EXPONENTIAL_SECONDS)
                .unwrap_or_else(|_| PrometheusBuilder::new())
                .add_global_label("servicename", service.name.clone())
                .add_global_label("serviceversion", service.version.clone());

            let recorder = builder.build_recorder();
            let handle = recorder.handle();
            if let Err(e) = metrics::set_global_recorder(recorder) {
                tracing::warn!(error = %e, "Metrics recorder already installed elsewhere");
            }
            handle
        })
        .clone()
}

/// Middleware to record some common HTTP metrics.
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };
    let method = req.method().to_string();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "http_requests_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(latency);

    response
}

/// Record a store lookup.
pub fn record_db_request(method: &'static str, success: bool, start: Instant) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("db_requests_total", "result" => result, "method" => method).increment(1);
    metrics::histogram!("db_requests_latency", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Mirror the process health flag.
pub fn record_health(healthy: bool) {
    metrics::gauge!("lifecycle_health").set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_shutdown_initiated(trigger: &'static str) {
    metrics::counter!("lifecycle_shutdown_initiated_total", "trigger" => trigger).increment(1);
}

pub fn record_shutdown_completed(clean: bool) {
    let clean = if clean { "true" } else { "false" };
    metrics::counter!("lifecycle_shutdown_completed_total", "clean" => clean).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_is_installed_once() {
        let service = ServiceConfig {
            name: "hrapp".to_string(),
            version: "test".to_string(),
        };
        let first = install_recorder(&service);
        let second = install_recorder(&service);

        record_health(true);
        let rendered = second.render();
        assert!(rendered.contains("lifecycle_health"), "{rendered}");
        assert_eq!(first.render().is_empty(), rendered.is_empty());
    }
}
