//! Process-wide readiness flag.
//!
//! # State Transitions
//! ```text
//! NotReady → Ready      once, after warm-up
//! NotReady → Draining   shutdown before warm-up finished
//! Ready    → Draining   once, first step of shutdown
//! ```
//!
//! Probes only ever read the latest value. The orchestrator is the only writer,
//! and the flag never goes back to `Ready` once draining.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const NOT_READY: u8 = 0;
const READY: u8 = 1;
const DRAINING: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    NotReady,
    Ready,
    Draining,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::NotReady => write!(f, "not-ready"),
            HealthState::Ready => write!(f, "ready"),
            HealthState::Draining => write!(f, "draining"),
        }
    }
}

/// Shared handle on the health flag. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct HealthGate {
    state: Arc<AtomicU8>,
}

impl HealthGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only between warm-up completion and the start of shutdown.
    pub fn is_healthy(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    pub fn state(&self) -> HealthState {
        match self.state.load(Ordering::Acquire) {
            NOT_READY => HealthState::NotReady,
            READY => HealthState::Ready,
            _ => HealthState::Draining,
        }
    }

    /// Flip to healthy. Returns false if the flag was already ready or draining.
    pub(crate) fn mark_ready(&self) -> bool {
        self.state
            .compare_exchange(NOT_READY, READY, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Flip to unhealthy for good. Returns false if already draining.
    pub(crate) fn mark_draining(&self) -> bool {
        self.state.swap(DRAINING, Ordering::AcqRel) != DRAINING
    }
}
