//! External interrupt listener: SIGINT and SIGTERM on unix, Ctrl-C elsewhere.
//!
//! Handlers are registered in [`InterruptListener::install`], so the default
//! "terminate immediately" disposition is replaced before the pipeline
//! starts. The listener keeps receiving after the first signal; the
//! controller relies on that to escalate a stuck drain into an abort.

use crate::error::CutError;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::info;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Something the controller can wait on for interrupts, repeatedly.
pub trait InterruptSource {
    /// Resolves when the next interrupt arrives.
    fn interrupted(&mut self) -> impl Future<Output = ()>;
}

/// Interrupts forwarded over a channel. A closed channel never interrupts.
impl InterruptSource for mpsc::UnboundedReceiver<()> {
    async fn interrupted(&mut self) {
        if self.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
pub struct InterruptListener {
    sigint: Signal,
    sigterm: Signal,
}

#[cfg(unix)]
impl InterruptListener {
    /// Must be called from within a tokio runtime.
    pub fn install() -> Result<Self, CutError> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt()).map_err(CutError::Signal)?,
            sigterm: signal(SignalKind::terminate()).map_err(CutError::Signal)?,
        })
    }
}

#[cfg(unix)]
impl InterruptSource for InterruptListener {
    async fn interrupted(&mut self) {
        let name = tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
        };
        info!(signal = name, "received termination signal");
    }
}

#[cfg(not(unix))]
pub struct InterruptListener;

#[cfg(not(unix))]
impl InterruptListener {
    pub fn install() -> Result<Self, CutError> {
        Ok(Self)
    }
}

#[cfg(not(unix))]
impl InterruptSource for InterruptListener {
    async fn interrupted(&mut self) {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(signal = "Ctrl-C", "received termination signal");
        } else {
            // No handler could be installed; never report an interrupt.
            std::future::pending::<()>().await;
        }
    }
}
