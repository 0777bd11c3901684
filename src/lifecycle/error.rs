use std::time::Duration;

use thiserror::Error;

use crate::admin::AdminError;
use crate::service::ServiceError;

/// Why [`Orchestrator::run`](super::Orchestrator::run) did not finish cleanly.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("admin sidecar failed to initialize: {0}")]
    AdminInit(#[source] AdminError),

    #[error("service '{service}' failed to initialize: {source}")]
    ServiceInit {
        service: String,
        #[source]
        source: ServiceError,
    },

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("admin sidecar failed to start: {0}")]
    AdminStart(#[source] AdminError),

    /// The admin sidecar's serve loop failed and took the process down with it.
    #[error("admin sidecar failed while serving: {0}")]
    AdminFailure(String),

    #[error("admin sidecar failed to stop: {0}")]
    AdminShutdown(#[source] AdminError),

    /// Services still running after the grace period; they were aborted.
    #[error("shutdown did not complete within {grace:?}, services still running: {remaining:?}")]
    ShutdownFault {
        grace: Duration,
        remaining: Vec<String>,
    },

    #[error("service '{service}' failed: {source}")]
    ServiceFault {
        service: String,
        #[source]
        source: ServiceError,
    },
}

impl LifecycleError {
    /// Process exit code for this failure. Never zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            LifecycleError::AdminInit(_)
            | LifecycleError::ServiceInit { .. }
            | LifecycleError::Signals(_)
            | LifecycleError::AdminStart(_) => 2,
            _ => 1,
        }
    }
}
