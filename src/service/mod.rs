//! Hosted-service contract.
//!
//! # Lifecycle
//! ```text
//! constructed by caller
//!     → init()            exactly once, binds/loads, never accepts traffic
//!     → run()             exactly once, on its own task, blocks until stopped
//!     → handle_command()  any time while running; SHUTDOWN makes run() return
//!     → readiness()       non-blocking probe, no side effects
//! ```
//!
//! # Design Decisions
//! - Every server (RPC, HTTP) implements all four capabilities
//! - Stopping is cooperative through the command channel; there is no deadline on `run`
//! - Unknown commands are ignored so newer callers can talk to older services

pub mod command;
pub mod error;

use async_trait::async_trait;

pub use command::{Command, SHUTDOWN};
pub use error::ServiceError;

/// A network server supervised by the orchestrator.
#[async_trait]
pub trait HostedService: Send + Sync + 'static {
    /// Logical name used in logs and metrics.
    fn name(&self) -> &str;

    /// One-time setup. Must not start accepting traffic.
    async fn init(&mut self) -> Result<(), ServiceError>;

    /// Accept traffic until told to stop, then return.
    async fn run(&self) -> Result<(), ServiceError>;

    /// Accept an out-of-band command. Unknown commands are not an error.
    async fn handle_command(&self, command: Command) -> Result<(), ServiceError>;

    /// Whether the service can take requests right now. The orchestrator logs it for each
    /// service when process health flips to true.
    fn readiness(&self) -> bool;
}
