//! Cooperative shutdown broadcast.
//!
//! The trigger holds the only sender of a channel that never carries a
//! message. Triggering drops it, so every [`ShutdownSignal`] sees the
//! channel disconnected: `is_triggered` turns true and a `recv` arm inside
//! `crossbeam_channel::select!` becomes ready.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Fires the shutdown. Consumed on use.
#[derive(Debug)]
pub struct ShutdownTrigger {
    _tx: Sender<()>,
}

/// Observes the shutdown. Cheap to clone, one per stage.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    (ShutdownTrigger { _tx: tx }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    pub fn trigger(self) {}
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready once the shutdown fired.
    pub fn as_receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
