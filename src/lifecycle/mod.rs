//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (orchestrator.rs):
//!     Admin init → Service init (in order) → Admin run → Service run (concurrent)
//!     → warm-up → health true
//!
//! Triggers (signals.rs, shutdown.rs):
//!     SIGTERM/SIGINT, a service run returning, admin serve failure
//!     → single trigger queue → first one wins
//!     SIGHUP → logged, no reload
//!
//! Shutdown (orchestrator.rs):
//!     health false → SHUTDOWN to every service → admin stop → join (bounded)
//! ```
//!
//! # Design Decisions
//! - Any init failure is fatal; nothing is started
//! - Exactly one shutdown sequence per orchestrator
//! - Services that outlive the grace period are aborted and reported as a fault

pub mod error;
pub mod orchestrator;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use error::LifecycleError;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorHandle};
pub use shutdown::{OsSignal, ShutdownLatch, ShutdownTrigger};
pub use state::LifecycleState;
