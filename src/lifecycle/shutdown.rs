//! Shutdown triggers and the once-only latch that admits the first one.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// OS signals the orchestrator listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsSignal {
    /// SIGHUP. Recognized, but configuration reload is not implemented.
    Hangup,
    /// SIGINT.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for OsSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsSignal::Hangup => f.write_str("SIGHUP"),
            OsSignal::Interrupt => f.write_str("SIGINT"),
            OsSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// An event that ends the running phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownTrigger {
    Signal(OsSignal),
    /// A hosted service's `run` returned, or shutdown was requested in-process.
    InternalStop { source: String },
    /// The admin sidecar's serve loop failed.
    AdminFailure(String),
}

impl ShutdownTrigger {
    /// Metric label for the trigger kind.
    pub fn reason(&self) -> &'static str {
        match self {
            ShutdownTrigger::Signal(_) => "signal",
            ShutdownTrigger::InternalStop { .. } => "internal_stop",
            ShutdownTrigger::AdminFailure(_) => "admin_failure",
        }
    }

    pub fn is_reload(&self) -> bool {
        matches!(self, ShutdownTrigger::Signal(OsSignal::Hangup))
    }
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::Signal(signal) => write!(f, "signal {signal}"),
            ShutdownTrigger::InternalStop { source } => write!(f, "internal stop from {source}"),
            ShutdownTrigger::AdminFailure(reason) => write!(f, "admin failure: {reason}"),
        }
    }
}

/// Admits exactly one shutdown sequence per orchestrator.
#[derive(Debug, Default)]
pub struct ShutdownLatch {
    begun: AtomicBool,
}

impl ShutdownLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for the first caller only.
    pub fn try_begin(&self) -> bool {
        !self.begun.swap(true, Ordering::AcqRel)
    }

    pub fn is_begun(&self) -> bool {
        self.begun.load(Ordering::Acquire)
    }
}
