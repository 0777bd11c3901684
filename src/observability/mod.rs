//! Logs and metrics for the supervisor and its servers.
//!
//! # Outputs
//! ```text
//! tracing events  → logging.rs → stdout (json | pretty), flushed on exit
//! metrics macros  → metrics.rs → Prometheus recorder → admin GET /metrics
//! ```
//!
//! Every span opened by the orchestrator carries the service name and version;
//! every metric series carries them as global labels.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingError};
