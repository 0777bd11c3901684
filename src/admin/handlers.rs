use axum::{extract::State, http::StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::admin::health::HealthGate;

/// State shared by the admin routes.
#[derive(Clone)]
pub struct AdminState {
    pub health: HealthGate,
    pub metrics: PrometheusHandle,
}

/// `GET /health`: 200 while the process reports healthy, 503 otherwise.
pub async fn get_health(State(state): State<AdminState>) -> StatusCode {
    if state.health.is_healthy() {
        tracing::debug!("Health: Server is ready");
        StatusCode::OK
    } else {
        tracing::debug!(state = %state.health.state(), "Health: Server is not ready");
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// `GET /metrics`: Prometheus exposition format.
pub async fn get_metrics(State(state): State<AdminState>) -> String {
    state.metrics.render()
}
