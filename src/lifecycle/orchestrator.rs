//! The lifecycle supervisor.
//!
//! # State Transitions
//! ```text
//! Uninitialized → Initializing      admin init, then each service init in order (fail fast)
//! Initializing  → RunningNotReady   admin run, every service run on its own task
//! RunningNotReady → RunningReady    warm-up elapsed, health = true
//! Running*      → ShuttingDown      first trigger: signal, service exit, admin failure
//! ShuttingDown  → Stopped           health = false, SHUTDOWN broadcast, admin stop, join
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures_util::future::join_all;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn, Instrument};

use crate::admin::{AdminFailure, AdminServer, HealthGate};
use crate::config::{HrappConfig, LifecycleConfig};
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::shutdown::{ShutdownLatch, ShutdownTrigger};
use crate::lifecycle::signals;
use crate::lifecycle::state::LifecycleState;
use crate::observability::{logging, metrics};
use crate::service::{Command, HostedService, ServiceError};

type ServiceTask = (String, JoinHandle<Result<(), ServiceError>>);

/// Supervises the admin sidecar and a fixed set of hosted services.
pub struct Orchestrator {
    config: HrappConfig,
    services: Vec<Box<dyn HostedService>>,
    metrics: Option<PrometheusHandle>,
    health: HealthGate,
    latch: Arc<ShutdownLatch>,
    admin_addr: Arc<OnceLock<SocketAddr>>,
    triggers_tx: mpsc::UnboundedSender<ShutdownTrigger>,
    triggers_rx: mpsc::UnboundedReceiver<ShutdownTrigger>,
    state_tx: watch::Sender<LifecycleState>,
}

pub struct OrchestratorBuilder {
    config: HrappConfig,
    services: Vec<Box<dyn HostedService>>,
    metrics: Option<PrometheusHandle>,
}

impl OrchestratorBuilder {
    /// Add a hosted service. Services are initialized in the order they are added.
    pub fn service(self, service: impl HostedService) -> Self {
        self.boxed_service(Box::new(service))
    }

    pub fn boxed_service(mut self, service: Box<dyn HostedService>) -> Self {
        self.services.push(service);
        self
    }

    /// Render `/metrics` from this handle instead of installing the process recorder.
    pub fn metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn build(self) -> Orchestrator {
        let (triggers_tx, triggers_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(LifecycleState::Uninitialized);
        Orchestrator {
            config: self.config,
            services: self.services,
            metrics: self.metrics,
            health: HealthGate::new(),
            latch: Arc::new(ShutdownLatch::new()),
            admin_addr: Arc::new(OnceLock::new()),
            triggers_tx,
            triggers_rx,
            state_tx,
        }
    }
}

/// Cloneable view of a running orchestrator.
#[derive(Clone)]
pub struct OrchestratorHandle {
    triggers: mpsc::UnboundedSender<ShutdownTrigger>,
    health: HealthGate,
    latch: Arc<ShutdownLatch>,
    admin_addr: Arc<OnceLock<SocketAddr>>,
    state: watch::Receiver<LifecycleState>,
}

impl OrchestratorHandle {
    /// Deliver a trigger as if it came from its source. Ignored once shutdown has begun.
    pub fn trigger(&self, trigger: ShutdownTrigger) {
        if self.triggers.send(trigger).is_err() {
            tracing::debug!("Lifecycle: Orchestrator no longer accepting triggers");
        }
    }

    /// Ask the orchestrator to shut down.
    pub fn shutdown(&self) {
        self.trigger(ShutdownTrigger::InternalStop {
            source: "handle".to_string(),
        });
    }

    pub fn health(&self) -> &HealthGate {
        &self.health
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Serving traffic, whether or not warm-up has elapsed.
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.latch.is_begun()
    }

    /// Admin sidecar address, once bound.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr.get().copied()
    }

    /// Wait until the orchestrator reaches `target` or a later state.
    pub async fn wait_for(&mut self, target: LifecycleState) -> LifecycleState {
        let reached = self
            .state
            .wait_for(|state| *state >= target)
            .await
            .map(|state| *state);
        reached.unwrap_or_else(|_| *self.state.borrow())
    }
}

impl Orchestrator {
    pub fn builder(config: HrappConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            services: Vec::new(),
            metrics: None,
        }
    }

    pub fn handle(&self) -> OrchestratorHandle {
        OrchestratorHandle {
            triggers: self.triggers_tx.clone(),
            health: self.health.clone(),
            latch: self.latch.clone(),
            admin_addr: self.admin_addr.clone(),
            state: self.state_tx.subscribe(),
        }
    }

    /// Initialize, run until the first shutdown trigger, then tear everything down.
    ///
    /// Returns only after every hosted service task has finished or been aborted
    /// and the admin sidecar has stopped.
    pub async fn run(self) -> Result<(), LifecycleError> {
        let span = tracing::info_span!(
            "server",
            name = %self.config.service.name,
            version = %self.config.service.version,
        );
        self.supervise().instrument(span).await
    }

    async fn supervise(self) -> Result<(), LifecycleError> {
        let Orchestrator {
            config,
            mut services,
            metrics: metrics_handle,
            health,
            latch,
            admin_addr,
            triggers_tx,
            mut triggers_rx,
            state_tx,
        } = self;
        let _stopped = MarkStopped(&state_tx);
        let set_state = |state: LifecycleState| {
            state_tx.send_replace(state);
            tracing::debug!(state = %state, "Lifecycle: State changed");
        };

        set_state(LifecycleState::Initializing);
        let metrics_handle =
            metrics_handle.unwrap_or_else(|| metrics::install_recorder(&config.service));
        metrics::record_health(false);

        info!("Lifecycle: Initializing admin sidecar");
        let mut admin =
            AdminServer::new(config.admin.clone(), health.clone(), metrics_handle.clone());
        admin.init().map_err(LifecycleError::AdminInit)?;
        if let Some(addr) = admin.local_addr() {
            let _ = admin_addr.set(addr);
        }

        for service in services.iter_mut() {
            let name = service.name().to_string();
            info!(service = %name, "Lifecycle: Initializing service");
            let span = tracing::info_span!("service", name = %name);
            if let Err(source) = service.init().instrument(span).await {
                error!(service = %name, error = %source, "Lifecycle: Service failed to initialize");
                return Err(LifecycleError::ServiceInit {
                    service: name,
                    source,
                });
            }
        }

        let signal_listener = if config.lifecycle.trap_signals {
            Some(signals::spawn_listener(triggers_tx.clone()).map_err(LifecycleError::Signals)?)
        } else {
            None
        };

        let admin_failure = admin.run().map_err(LifecycleError::AdminStart)?;
        forward_admin_failure(admin_failure, triggers_tx.clone());

        let tracker = TaskTracker::new();
        let services: Vec<Arc<dyn HostedService>> = services.into_iter().map(Arc::from).collect();
        let mut running: Vec<ServiceTask> = Vec::with_capacity(services.len());
        for service in &services {
            let service = Arc::clone(service);
            let name = service.name().to_string();
            let triggers = triggers_tx.clone();
            let source = name.clone();
            let span = tracing::info_span!("service", name = %name);
            let task = tracker.spawn(
                async move {
                    let result = service.run().await;
                    match &result {
                        Ok(()) => info!("Lifecycle: Service stopped"),
                        Err(e) => error!(error = %e, "Lifecycle: Service stopped with error"),
                    }
                    let _ = triggers.send(ShutdownTrigger::InternalStop { source });
                    result
                }
                .instrument(span),
            );
            running.push((name, task));
        }
        drop(triggers_tx);
        set_state(LifecycleState::RunningNotReady);
        info!(
            services = running.len(),
            warmup = ?config.lifecycle.warmup(),
            "Lifecycle: Servers started"
        );

        let warmup = tokio::time::sleep(config.lifecycle.warmup());
        tokio::pin!(warmup);
        let mut warmed_up = false;
        let trigger = loop {
            tokio::select! {
                _ = &mut warmup, if !warmed_up => {
                    warmed_up = true;
                    if health.mark_ready() {
                        metrics::record_health(true);
                        for service in &services {
                            if service.readiness() {
                                info!(service = service.name(), "Lifecycle: Service ready");
                            } else {
                                warn!(service = service.name(), "Lifecycle: Service not ready yet");
                            }
                        }
                        set_state(LifecycleState::RunningReady);
                        info!("Lifecycle: Health is true, ready to serve");
                    }
                }
                received = triggers_rx.recv() => match received {
                    Some(trigger) if trigger.is_reload() => {
                        info!(trigger = %trigger, "Lifecycle: Reload requested, not implemented");
                    }
                    Some(trigger) => {
                        if latch.try_begin() {
                            break trigger;
                        }
                    }
                    None => {
                        // Every sender is gone: no service, no admin, no handle left to trigger.
                        latch.try_begin();
                        break ShutdownTrigger::InternalStop { source: "orchestrator".to_string() };
                    }
                },
            }
        };

        health.mark_draining();
        metrics::record_health(false);
        set_state(LifecycleState::ShuttingDown);
        metrics::record_shutdown_initiated(trigger.reason());
        info!(
            trigger = %trigger,
            reason = trigger.reason(),
            "Lifecycle: Shutdown initiated, health is false"
        );

        let outcome = shut_down(
            &config.lifecycle,
            &services,
            running,
            &tracker,
            &mut admin,
        )
        .await;
        triggers_rx.close();

        if let Some(listener) = signal_listener {
            listener.abort();
        }

        let result = match (outcome, trigger) {
            (Err(e), _) => Err(e),
            (Ok(()), ShutdownTrigger::AdminFailure(reason)) => {
                Err(LifecycleError::AdminFailure(reason))
            }
            (Ok(()), _) => Ok(()),
        };

        metrics::record_shutdown_completed(result.is_ok());
        match &result {
            Ok(()) => info!("Lifecycle: Shutdown complete"),
            Err(e) => error!(error = %e, "Lifecycle: Shutdown completed with errors"),
        }
        metrics_handle.run_upkeep();
        logging::flush();
        result
    }
}

/// Turn an admin serve-loop failure into a shutdown trigger. A clean admin exit sends nothing.
fn forward_admin_failure(
    failure: AdminFailure,
    triggers: mpsc::UnboundedSender<ShutdownTrigger>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Ok(err) = failure.await {
            warn!(error = %err, "Lifecycle: Admin sidecar failed");
            let _ = triggers.send(ShutdownTrigger::AdminFailure(err.to_string()));
        }
    })
}

/// Publishes `Stopped` however supervision ends, including init failures.
struct MarkStopped<'a>(&'a watch::Sender<LifecycleState>);

impl Drop for MarkStopped<'_> {
    fn drop(&mut self) {
        self.0.send_replace(LifecycleState::Stopped);
    }
}

/// SHUTDOWN to everyone, admin stop, then wait for every service task.
///
/// One grace deadline covers both the SHUTDOWN broadcast and the wait for the tasks.
async fn shut_down(
    config: &LifecycleConfig,
    services: &[Arc<dyn HostedService>],
    running: Vec<ServiceTask>,
    tracker: &TaskTracker,
    admin: &mut AdminServer,
) -> Result<(), LifecycleError> {
    let grace = config.shutdown_grace();
    let deadline = Instant::now() + grace;

    let commands = services.iter().map(|service| async move {
        match timeout_at(deadline, service.handle_command(Command::shutdown())).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                warn!(service = service.name(), error = %e, "Lifecycle: SHUTDOWN command failed");
                None
            }
            Err(_) => {
                error!(service = service.name(), "Lifecycle: SHUTDOWN command still pending");
                Some(service.name().to_string())
            }
        }
    });
    let mut remaining: Vec<String> = join_all(commands).await.into_iter().flatten().collect();

    let admin_result = admin.shutdown().await;

    tracker.close();
    for name in wait_or_abort(tracker, &running, deadline, grace).await {
        if !remaining.contains(&name) {
            remaining.push(name);
        }
    }

    let mut first_fault = None;
    for (name, task) in running {
        let fault = match task.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(e) if e.is_cancelled() => None,
            Err(e) => Some(ServiceError::serve(&name, e)),
        };
        if let (Some(source), true) = (fault, first_fault.is_none()) {
            first_fault = Some(LifecycleError::ServiceFault {
                service: name,
                source,
            });
        }
    }

    admin_result.map_err(LifecycleError::AdminShutdown)?;
    if !remaining.is_empty() {
        return Err(LifecycleError::ShutdownFault { grace, remaining });
    }
    first_fault.map_or(Ok(()), Err)
}

/// Wait for every tracked task until `deadline`, then abort the stragglers and return their names.
async fn wait_or_abort(
    tracker: &TaskTracker,
    running: &[ServiceTask],
    deadline: Instant,
    grace: Duration,
) -> Vec<String> {
    if timeout_at(deadline, tracker.wait()).await.is_ok() {
        info!("Lifecycle: All services stopped");
        return Vec::new();
    }

    let remaining: Vec<String> = running
        .iter()
        .filter(|(_, task)| !task.is_finished())
        .map(|(name, task)| {
            task.abort();
            name.clone()
        })
        .collect();
    error!(
        grace = ?grace,
        remaining = ?remaining,
        "Lifecycle: Services did not stop within the grace period, force closing"
    );
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminError;
    use tokio::sync::oneshot;

    fn config() -> HrappConfig {
        let mut config = HrappConfig::default();
        config.admin.listen_address = "127.0.0.1:0".to_string();
        config.admin.shutdown_grace_secs = 1;
        config.lifecycle.warmup_ms = 50;
        config.lifecycle.shutdown_grace_secs = 1;
        config.lifecycle.trap_signals = false;
        config
    }

    fn serve_failure() -> AdminError {
        AdminError::Serve(std::io::Error::other("accept loop died"))
    }

    #[tokio::test]
    async fn admin_serve_failure_becomes_a_trigger() {
        let (failure_tx, failure_rx) = oneshot::channel();
        let (triggers_tx, mut triggers_rx) = mpsc::unbounded_channel();
        let forwarder = forward_admin_failure(failure_rx, triggers_tx);

        failure_tx.send(serve_failure()).unwrap();
        forwarder.await.unwrap();

        match triggers_rx.recv().await {
            Some(ShutdownTrigger::AdminFailure(reason)) => {
                assert!(reason.contains("accept loop died"), "{reason}")
            }
            other => panic!("unexpected trigger: {other:?}"),
        }
    }

    #[tokio::test]
    async fn clean_admin_exit_sends_nothing() {
        let (failure_tx, failure_rx) = oneshot::channel::<AdminError>();
        let (triggers_tx, mut triggers_rx) = mpsc::unbounded_channel();
        let forwarder = forward_admin_failure(failure_rx, triggers_tx);

        drop(failure_tx);
        forwarder.await.unwrap();
        assert!(triggers_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn admin_serve_failure_shuts_the_orchestrator_down() {
        let orchestrator = Orchestrator::builder(config()).build();
        let mut handle = orchestrator.handle();
        let run = tokio::spawn(orchestrator.run());

        handle.wait_for(LifecycleState::RunningNotReady).await;
        assert!(handle.is_running());

        let (failure_tx, failure_rx) = oneshot::channel();
        forward_admin_failure(failure_rx, handle.triggers.clone());
        failure_tx.send(serve_failure()).unwrap();

        let err = tokio::time::timeout(Duration::from_secs(10), run)
            .await
            .expect("orchestrator did not return")
            .unwrap()
            .unwrap_err();
        match &err {
            LifecycleError::AdminFailure(reason) => assert!(reason.contains("accept loop died")),
            other => panic!("unexpected error: {other}"),
        }
        assert_ne!(err.exit_code(), 0);
        assert!(!handle.is_running());
        assert_eq!(handle.state(), LifecycleState::Stopped);
        assert!(!handle.health().is_healthy());
    }
}
