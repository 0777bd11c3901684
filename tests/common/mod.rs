//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use hrapp::config::HrappConfig;
use hrapp::employees::{Employee, MemoryStore};
use hrapp::{Command, HostedService, ServiceError};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Defaults with ephemeral admin port, short warm-up and grace, no signal handlers.
pub fn test_config() -> HrappConfig {
    let mut config = HrappConfig::default();
    config.admin.listen_address = "127.0.0.1:0".to_string();
    config.admin.shutdown_grace_secs = 1;
    config.lifecycle.warmup_ms = 200;
    config.lifecycle.shutdown_grace_secs = 1;
    config.lifecycle.trap_signals = false;
    config
}

pub fn seeded_store() -> MemoryStore {
    MemoryStore::from_records([
        Employee {
            id: 1,
            name: "Ada".to_string(),
            title: "CEO".to_string(),
            reports: vec![2, 3],
        },
        Employee {
            id: 2,
            name: "Grace".to_string(),
            title: "CTO".to_string(),
            reports: vec![4],
        },
        Employee {
            id: 3,
            name: "Linus".to_string(),
            title: "CFO".to_string(),
            reports: vec![],
        },
        Employee {
            id: 4,
            name: "Ken".to_string(),
            title: "Engineer".to_string(),
            reports: vec![],
        },
    ])
}

/// Status code of `GET /health`, or `None` if nothing is listening.
pub async fn health_status(addr: SocketAddr) -> Option<u16> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .ok()?;
    let res = client.get(format!("http://{addr}/health")).send().await.ok()?;
    Some(res.status().as_u16())
}

pub async fn wait_for_condition<F, Fut>(timeout: Duration, interval: Duration, f: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if f().await {
            return;
        }
        tokio::time::sleep(interval).await;
    }
    panic!("condition not met within {timeout:?}");
}

/// Counters shared between a [`MockService`] and the test.
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    inits: Arc<AtomicUsize>,
    runs_started: Arc<AtomicUsize>,
    runs_returned: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
    other_commands: Arc<AtomicUsize>,
    readiness_checks: Arc<AtomicUsize>,
}

impl MockProbe {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn runs_started(&self) -> usize {
        self.runs_started.load(Ordering::SeqCst)
    }

    pub fn runs_returned(&self) -> usize {
        self.runs_returned.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn other_commands(&self) -> usize {
        self.other_commands.load(Ordering::SeqCst)
    }

    pub fn readiness_checks(&self) -> usize {
        self.readiness_checks.load(Ordering::SeqCst)
    }
}

/// How a [`MockService`]'s `run` ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunBehavior {
    /// Block until SHUTDOWN.
    UntilShutdown,
    /// Ignore SHUTDOWN and block forever.
    IgnoreShutdown,
    /// Return `Ok` on its own after the delay.
    ExitAfter(Duration),
    /// Return an error on its own after the delay.
    FailAfter(Duration),
}

/// A hosted service that does nothing but record what the orchestrator asks of it.
pub struct MockService {
    name: String,
    fail_init: bool,
    behavior: RunBehavior,
    command_delay: Duration,
    stop: CancellationToken,
    probe: MockProbe,
}

impl MockService {
    pub fn new(name: &str) -> (Self, MockProbe) {
        let probe = MockProbe::default();
        let service = Self {
            name: name.to_string(),
            fail_init: false,
            behavior: RunBehavior::UntilShutdown,
            command_delay: Duration::ZERO,
            stop: CancellationToken::new(),
            probe: probe.clone(),
        };
        (service, probe)
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn behavior(mut self, behavior: RunBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Hold every command this long before acting on it.
    pub fn command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }
}

#[async_trait]
impl HostedService for MockService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&mut self) -> Result<(), ServiceError> {
        self.probe.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(ServiceError::initialization(&self.name, "injected failure"));
        }
        Ok(())
    }

    async fn run(&self) -> Result<(), ServiceError> {
        self.probe.runs_started.fetch_add(1, Ordering::SeqCst);
        let result = match self.behavior {
            RunBehavior::UntilShutdown => {
                self.stop.cancelled().await;
                Ok(())
            }
            RunBehavior::IgnoreShutdown => std::future::pending().await,
            RunBehavior::ExitAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            RunBehavior::FailAfter(delay) => {
                tokio::time::sleep(delay).await;
                Err(ServiceError::serve(&self.name, "injected serve failure"))
            }
        };
        self.probe.runs_returned.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn handle_command(&self, command: Command) -> Result<(), ServiceError> {
        tokio::time::sleep(self.command_delay).await;
        if command.is_shutdown() {
            self.probe.shutdowns.fetch_add(1, Ordering::SeqCst);
            self.stop.cancel();
        } else {
            self.probe.other_commands.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn readiness(&self) -> bool {
        self.probe.readiness_checks.fetch_add(1, Ordering::SeqCst);
        !self.stop.is_cancelled()
    }
}
