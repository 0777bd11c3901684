//! OS signal handling.
//!
//! SIGINT and SIGTERM become shutdown triggers. SIGHUP is forwarded as well so
//! the orchestrator can log it; it never starts a shutdown.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{OsSignal, ShutdownTrigger};

/// Install handlers and forward every received signal to `triggers` until the
/// receiving side goes away.
#[cfg(unix)]
pub(crate) fn spawn_listener(
    triggers: UnboundedSender<ShutdownTrigger>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = hangup.recv() => OsSignal::Hangup,
                Some(()) = interrupt.recv() => OsSignal::Interrupt,
                Some(()) = terminate.recv() => OsSignal::Terminate,
                else => break,
            };
            tracing::info!(signal = %received, "Lifecycle: Received signal");
            if triggers.send(ShutdownTrigger::Signal(received)).is_err() {
                break;
            }
        }
    }))
}

#[cfg(not(unix))]
pub(crate) fn spawn_listener(
    triggers: UnboundedSender<ShutdownTrigger>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(signal = %OsSignal::Interrupt, "Lifecycle: Received signal");
            if triggers
                .send(ShutdownTrigger::Signal(OsSignal::Interrupt))
                .is_err()
            {
                break;
            }
        }
    }))
}
