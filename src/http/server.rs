//! HTTP server adapter.
//!
//! # Responsibilities
//! - Host an [`HttpHandler`]'s routes behind timeout, trace and metrics layers
//! - Optional TLS from PEM files
//! - Graceful stop on `SHUTDOWN`: stop accepting, drain for the grace period, then force close

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::Mutex;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::HttpConfig;
use crate::http::handler::HttpHandler;
use crate::net::{self, tls};
use crate::observability::metrics::track_metrics;
use crate::service::{Command, HostedService, ServiceError};

pub struct HttpServer {
    name: String,
    config: HttpConfig,
    handler: Box<dyn HttpHandler>,
    tls: Option<RustlsConfig>,
    listener: Mutex<Option<std::net::TcpListener>>,
    router: Mutex<Option<Router>>,
    local_addr: Option<SocketAddr>,
    handle: Handle,
    serving: AtomicBool,
    stopping: AtomicBool,
}

impl HttpServer {
    pub fn new(config: HttpConfig, handler: Box<dyn HttpHandler>) -> Self {
        Self {
            name: "httpserver".to_string(),
            config,
            handler,
            tls: None,
            listener: Mutex::new(None),
            router: Mutex::new(None),
            local_addr: None,
            handle: Handle::new(),
            serving: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
        }
    }

    /// Bound address, available after `init`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Build the router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(&self) -> Router {
        self.handler
            .routes()
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.request_timeout_secs,
            )))
            .layer(middleware::from_fn(track_metrics))
            .layer(TraceLayer::new_for_http())
    }

    fn not_initialized(&self) -> ServiceError {
        ServiceError::NotInitialized {
            service: self.name.clone(),
        }
    }
}

#[async_trait]
impl HostedService for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&mut self) -> Result<(), ServiceError> {
        self.handler.init().await?;

        let listener = net::bind(&self.config.listen_address)?;
        self.local_addr = listener.local_addr().ok();

        if let Some(tls_config) = &self.config.tls {
            self.tls = Some(tls::load_tls_config(tls_config).await?);
        }

        let router = self.build_router();
        *self.router.get_mut() = Some(router);
        *self.listener.get_mut() = Some(listener);

        tracing::info!(
            address = ?self.local_addr,
            handler = self.handler.name(),
            tls = self.tls.is_some(),
            "HTTP server: Initialized"
        );
        Ok(())
    }

    async fn run(&self) -> Result<(), ServiceError> {
        let listener = self
            .listener
            .lock()
            .await
            .take()
            .ok_or_else(|| self.not_initialized())?;
        let router = self
            .router
            .lock()
            .await
            .take()
            .ok_or_else(|| self.not_initialized())?;
        let app = router.into_make_service();

        self.serving.store(true, Ordering::Release);
        tracing::info!(address = ?self.local_addr, "HTTP server: Server started");

        let result = match &self.tls {
            Some(tls) => {
                axum_server::from_tcp_rustls(listener, tls.clone())
                    .handle(self.handle.clone())
                    .serve(app)
                    .await
            }
            None => {
                axum_server::from_tcp(listener)
                    .handle(self.handle.clone())
                    .serve(app)
                    .await
            }
        };

        self.serving.store(false, Ordering::Release);
        match result {
            Ok(()) => {
                tracing::info!("HTTP server: Shut down");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "HTTP server: Serve loop failed");
                Err(ServiceError::serve(&self.name, e))
            }
        }
    }

    async fn handle_command(&self, command: Command) -> Result<(), ServiceError> {
        if !command.is_shutdown() {
            tracing::debug!(command = %command, "HTTP server: Ignoring unknown command");
            return Ok(());
        }
        if self.stopping.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let grace = self.config.shutdown_grace();
        tracing::info!(grace = ?grace, "HTTP server: Shutdown command received");
        self.serving.store(false, Ordering::Release);
        self.handle.graceful_shutdown(Some(grace));
        Ok(())
    }

    fn readiness(&self) -> bool {
        self.serving.load(Ordering::Acquire)
    }
}
