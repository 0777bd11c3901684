use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tonic::transport::{Server, ServerTlsConfig};
use tonic_health::server::HealthReporter;
use tonic_health::ServingStatus;

use crate::config::RpcConfig;
use crate::net::{self, tls};
use crate::rpc::handler::RpcHandler;
use crate::service::{Command, HostedService, ServiceError};

/// Overall server status in the gRPC health service.
const SERVER_HEALTH: &str = "";

/// gRPC transport hosting an [`RpcHandler`].
pub struct RpcServer {
    name: String,
    config: RpcConfig,
    handler: Box<dyn RpcHandler>,
    tls: Option<ServerTlsConfig>,
    listener: Mutex<Option<std::net::TcpListener>>,
    routes: Mutex<Option<Routes>>,
    reporter: Option<HealthReporter>,
    local_addr: Option<SocketAddr>,
    stop: CancellationToken,
    serving: AtomicBool,
}

impl RpcServer {
    pub fn new(config: RpcConfig, handler: Box<dyn RpcHandler>) -> Self {
        Self {
            name: "grpcserver".to_string(),
            config,
            handler,
            tls: None,
            listener: Mutex::new(None),
            routes: Mutex::new(None),
            reporter: None,
            local_addr: None,
            stop: CancellationToken::new(),
            serving: AtomicBool::new(false),
        }
    }

    /// Bound address, available after `init`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    async fn set_health(&self, status: ServingStatus) {
        if let Some(reporter) = &self.reporter {
            reporter.clone().set_service_status(SERVER_HEALTH, status).await;
        }
    }

    fn not_initialized(&self) -> ServiceError {
        ServiceError::NotInitialized {
            service: self.name.clone(),
        }
    }
}

#[async_trait]
impl HostedService for RpcServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&mut self) -> Result<(), ServiceError> {
        let listener = net::bind(&self.config.listen_address)?;
        self.local_addr = listener.local_addr().ok();

        if self.config.tls.enabled {
            tracing::info!("gRPC server: TLS enabled, requiring client certificates");
            self.tls = Some(tls::load_mutual_tls(&self.config.tls)?);
        } else {
            tracing::info!("gRPC server: TLS disabled, serving plaintext");
        }

        self.handler.init().await?;

        let (mut reporter, health_service) = tonic_health::server::health_reporter();
        reporter
            .set_service_status(SERVER_HEALTH, ServingStatus::NotServing)
            .await;
        let routes = self.handler.register(Routes::new(health_service));

        self.reporter = Some(reporter);
        *self.routes.get_mut() = Some(routes);
        *self.listener.get_mut() = Some(listener);

        tracing::info!(
            address = ?self.local_addr,
            handler = self.handler.name(),
            "gRPC server: Initialized"
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
        let routes = self
            .routes
            .lock()
            .await
            .take()
            .ok_or_else(|| self.not_initialized())?;

        let listener = tokio::net::TcpListener::from_std(listener)
            .map_err(|e| ServiceError::serve(&self.name, e))?;
        let incoming = TcpListenerStream::new(listener);

        let mut builder = Server::builder();
        if let Some(tls) = &self.tls {
            builder = builder
                .tls_config(tls.clone())
                .map_err(|e| ServiceError::serve(&self.name, e))?;
        }

        let serve = builder
            .add_routes(routes)
            .serve_with_incoming_shutdown(incoming, self.stop.clone().cancelled_owned());
        tokio::pin!(serve);

        self.serving.store(true, Ordering::Release);
        self.set_health(ServingStatus::Serving).await;
        tracing::info!(address = ?self.local_addr, "gRPC server: Server started");

        let grace = self.config.shutdown_grace();
        let stop = self.stop.clone();
        let result = tokio::select! {
            result = &mut serve => result.map_err(|e| ServiceError::serve(&self.name, e)),
            _ = async {
                stop.cancelled().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(
                    grace = ?grace,
                    "gRPC server: Connections did not drain, force closing"
                );
                Err(ServiceError::ShutdownTimeout {
                    service: self.name.clone(),
                    grace,
                })
            }
        };

        self.serving.store(false, Ordering::Release);
        match &result {
            Ok(()) => tracing::info!("gRPC server: Shut down"),
            Err(e) => tracing::error!(error = %e, "gRPC server: Stopped with error"),
        }
        result
    }

    async fn handle_command(&self, command: Command) -> Result<(), ServiceError> {
        if !command.is_shutdown() {
            tracing::debug!(command = %command, "gRPC server: Ignoring unknown command");
            return Ok(());
        }
        if self.stop.is_cancelled() {
            return Ok(());
        }

        tracing::info!("gRPC server: Shutdown command received");
        self.serving.store(false, Ordering::Release);
        self.set_health(ServingStatus::NotServing).await;
        self.handler.shutdown().await;
        self.stop.cancel();
        Ok(())
    }

    fn readiness(&self) -> bool {
        self.serving.load(Ordering::Acquire)
    }
}
