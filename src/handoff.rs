//! Zero-capacity handoff channels between pipeline stages.
//!
//! Every channel has exactly one producer and one consumer. A `send` blocks
//! until the consumer takes the value, so a slow stage stalls everything
//! upstream of it. Closing is done by the producer only (dropping or calling
//! [`HandoffSender::close`]) and is the sole termination signal.
//!
//! The lifecycle of a channel is tracked explicitly:
//!
//! ```text
//! Open ──producer closes──▶ Draining ──consumer observes──▶ Closed
//! ```

use crossbeam_channel::{Receiver, RecvError, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::trace;

/// Lifecycle of a handoff channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// The producer may still send.
    Open,
    /// The producer has closed; the consumer has not seen it yet.
    Draining,
    /// The consumer has observed the closure (or gone away).
    Closed,
}

impl ChannelState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ChannelState::Open,
            1 => ChannelState::Draining,
            _ => ChannelState::Closed,
        }
    }
}

#[derive(Debug)]
struct Lifecycle {
    name: &'static str,
    state: AtomicU8,
}

impl Lifecycle {
    fn get(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn mark_draining(&self) {
        if self
            .state
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            trace!(channel = self.name, "channel draining");
        }
    }

    fn mark_closed(&self) {
        if self.state.swap(2, Ordering::AcqRel) != 2 {
            trace!(channel = self.name, "channel closed");
        }
    }
}

/// Producer half of a handoff channel.
#[derive(Debug)]
pub struct HandoffSender<T> {
    tx: Sender<T>,
    lifecycle: Arc<Lifecycle>,
}

/// Consumer half of a handoff channel.
#[derive(Debug)]
pub struct HandoffReceiver<T> {
    rx: Receiver<T>,
    lifecycle: Arc<Lifecycle>,
}

/// The consumer is gone; the value that could not be delivered is returned.
#[derive(Debug, PartialEq, Eq)]
pub struct Disconnected<T>(pub T);

/// Create a named zero-capacity channel.
pub fn handoff<T>(name: &'static str) -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    let lifecycle = Arc::new(Lifecycle {
        name,
        state: AtomicU8::new(0),
    });
    (
        HandoffSender {
            tx,
            lifecycle: Arc::clone(&lifecycle),
        },
        HandoffReceiver { rx, lifecycle },
    )
}

impl<T> HandoffSender<T> {
    /// Block until the consumer accepts `item`.
    pub fn send(&self, item: T) -> Result<(), Disconnected<T>> {
        self.tx.send(item).map_err(|e| Disconnected(e.into_inner()))
    }

    /// Close the channel. Equivalent to dropping the sender.
    pub fn close(self) {}

    pub fn state(&self) -> ChannelState {
        self.lifecycle.get()
    }
}

impl<T> Drop for HandoffSender<T> {
    fn drop(&mut self) {
        self.lifecycle.mark_draining();
    }
}

impl<T> HandoffReceiver<T> {
    /// Block until a value arrives. `None` means the producer closed.
    pub fn recv(&self) -> Option<T> {
        let msg = self.rx.recv();
        self.observe(msg)
    }

    /// The raw receiver, for use inside `crossbeam_channel::select!`.
    ///
    /// Results taken from it must be passed through [`observe`](Self::observe)
    /// so closure is recorded.
    pub fn as_receiver(&self) -> &Receiver<T> {
        &self.rx
    }

    /// Record the outcome of a receive performed on the raw receiver.
    pub fn observe(&self, msg: Result<T, RecvError>) -> Option<T> {
        match msg {
            Ok(item) => Some(item),
            Err(RecvError) => {
                self.lifecycle.mark_closed();
                None
            }
        }
    }

    pub fn state(&self) -> ChannelState {
        self.lifecycle.get()
    }
}

impl<T> Drop for HandoffReceiver<T> {
    fn drop(&mut self) {
        self.lifecycle.mark_closed();
    }
}
