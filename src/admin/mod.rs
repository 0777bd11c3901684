//! Admin sidecar: health probe and metrics scrape endpoint.
//!
//! # Routes
//! - `GET /health`: 200 when the process is healthy, 503 otherwise
//! - `GET /metrics`: Prometheus text format
//!
//! # Lifecycle
//! ```text
//! init()      bind listener, build router
//! run()       spawn serve task, return immediately
//! shutdown()  graceful stop within the grace period, then force close
//! ```
//!
//! The sidecar is owned by the orchestrator and is never registered as a
//! hosted service. A serve failure after `run()` is reported once on the
//! receiver returned from `run()`.

pub mod handlers;
pub mod health;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use axum_server::Handle;
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::AdminConfig;
use crate::net::{self, BindError};
use crate::observability::metrics::track_metrics;

pub use handlers::AdminState;
pub use health::{HealthGate, HealthState};

/// Extra time allowed for the serve task to exit after connections are force closed.
const FORCE_CLOSE_MARGIN: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("admin: {0}")]
    Bind(#[from] BindError),

    #[error("admin: serve failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("admin: server did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("admin: run called before init")]
    NotInitialized,

    #[error("admin: run called after shutdown")]
    MarkedForShutdown,
}

/// Receives at most one serve failure from a running sidecar.
pub type AdminFailure = oneshot::Receiver<AdminError>;

pub struct AdminServer {
    config: AdminConfig,
    state: AdminState,
    listener: Option<std::net::TcpListener>,
    local_addr: Option<SocketAddr>,
    router: Option<Router>,
    handle: Handle,
    serve_task: Option<JoinHandle<()>>,
    marked_for_shutdown: bool,
}

impl AdminServer {
    pub fn new(config: AdminConfig, health: HealthGate, metrics: PrometheusHandle) -> Self {
        Self {
            config,
            state: AdminState { health, metrics },
            listener: None,
            local_addr: None,
            router: None,
            handle: Handle::new(),
            serve_task: None,
            marked_for_shutdown: false,
        }
    }

    /// Bind the listener and build the router. Does not accept traffic yet.
    pub fn init(&mut self) -> Result<(), AdminError> {
        let listener = net::bind(&self.config.listen_address)?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BindError::Bind {
                address: self.config.listen_address.clone(),
                source,
            })?;

        self.router = Some(Self::build_router(self.state.clone()));
        self.listener = Some(listener);
        self.local_addr = Some(local_addr);

        tracing::info!(address = %local_addr, "Admin: Initialized adminserver");
        Ok(())
    }

    fn build_router(state: AdminState) -> Router {
        Router::new()
            .route("/health", get(handlers::get_health))
            .route("/metrics", get(handlers::get_metrics))
            .layer(middleware::from_fn(track_metrics))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bound address, available after `init`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn health(&self) -> &HealthGate {
        &self.state.health
    }

    /// Start serving in the background.
    pub fn run(&mut self) -> Result<AdminFailure, AdminError> {
        if self.marked_for_shutdown {
            return Err(AdminError::MarkedForShutdown);
        }
        let listener = self.listener.take().ok_or(AdminError::NotInitialized)?;
        let router = self.router.take().ok_or(AdminError::NotInitialized)?;

        let (failure_tx, failure_rx) = oneshot::channel();
        let handle = self.handle.clone();
        self.serve_task = Some(tokio::spawn(async move {
            let result = axum_server::from_tcp(listener)
                .handle(handle)
                .serve(router.into_make_service())
                .await;
            match result {
                Ok(()) => tracing::debug!("Admin: Serve loop exited"),
                Err(e) => {
                    tracing::error!(error = %e, "Admin: Serve loop failed");
                    let _ = failure_tx.send(AdminError::Serve(e));
                }
            }
        }));

        tracing::info!(address = ?self.local_addr, "Admin: Started adminserver");
        Ok(failure_rx)
    }

    /// Stop accepting, drain within the grace period, and wait for the serve task to exit.
    ///
    /// Safe to call more than once and before `run`.
    pub async fn shutdown(&mut self) -> Result<(), AdminError> {
        self.marked_for_shutdown = true;
        self.listener = None;
        self.router = None;

        let Some(mut task) = self.serve_task.take() else {
            return Ok(());
        };

        tracing::info!("Admin: Stopping adminserver");
        let grace = self.config.shutdown_grace();
        self.handle.graceful_shutdown(Some(grace));

        match tokio::time::timeout(grace + FORCE_CLOSE_MARGIN, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(AdminError::Serve(std::io::Error::other(e.to_string())));
            }
            Err(_) => {
                task.abort();
                let _ = task.await;
                tracing::error!(grace = ?grace, "Admin: Server did not stop in time");
                return Err(AdminError::ShutdownTimeout(grace));
            }
        }

        tracing::info!("Admin: Stopped adminserver");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::observability::metrics::install_recorder;

    fn admin(grace_secs: u64) -> AdminServer {
        let config = AdminConfig {
            listen_address: "127.0.0.1:0".to_string(),
            shutdown_grace_secs: grace_secs,
        };
        let metrics = install_recorder(&ServiceConfig::default());
        AdminServer::new(config, HealthGate::new(), metrics)
    }

    #[tokio::test]
    async fn run_before_init_is_rejected() {
        let mut server = admin(1);
        assert!(matches!(server.run(), Err(AdminError::NotInitialized)));
    }

    #[tokio::test]
    async fn run_after_shutdown_is_rejected() {
        let mut server = admin(1);
        server.init().unwrap();
        server.shutdown().await.unwrap();
        assert!(matches!(server.run(), Err(AdminError::MarkedForShutdown)));
    }

    #[tokio::test]
    async fn health_follows_gate() {
        let mut server = admin(1);
        server.init().unwrap();
        let addr = server.local_addr().unwrap();
        let _failure = server.run().unwrap();

        let url = format!("http://{addr}/health");
        let status = reqwest::get(&url).await.unwrap().status();
        assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);

        server.health().mark_ready();
        let status = reqwest::get(&url).await.unwrap().status();
        assert_eq!(status, reqwest::StatusCode::OK);

        server.health().mark_draining();
        let status = reqwest::get(&url).await.unwrap().status();
        assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);

        server.shutdown().await.unwrap();
        assert!(reqwest::get(&url).await.is_err());
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut server = admin(1);
        server.config.listen_address = taken.local_addr().unwrap().to_string();
        assert!(matches!(server.init(), Err(AdminError::Bind(_))));
    }
}
