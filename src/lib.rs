//! # linecut
//!
//! A streaming filter that trims a fixed number of bytes from every line.
//!
//! Input is read line by line and moved through three concurrent stages
//! connected by zero-capacity channels:
//!
//! - **Source Reader** splits the input into lines (terminator stripped)
//! - **Transformer** keeps `line[leading .. trailing]` of every line
//! - **Sink Writer** buffers the results, one per line, into the output
//!
//! Because every handoff is a rendezvous, a slow output throttles the whole
//! pipeline and memory use stays bounded no matter how large the input is.
//! Line order is preserved end to end.
//!
//! ## Example
//!
//! ```
//! use linecut::{ByteTrim, Line};
//!
//! let trim = ByteTrim::new(1, 4);
//! let out = trim.apply(Line::from("abcdef")).unwrap();
//! assert_eq!(&out[..], b"bcd");
//! ```

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod handoff;
pub mod profile;
pub mod shutdown;
pub mod signals;
pub mod sink;
pub mod source;
pub mod stats;
pub mod transform;
pub mod trim;

#[cfg(test)]
pub(crate) mod test_utils;

/// One input record: raw bytes without the line terminator.
pub type Line = bytes::Bytes;

pub use config::{Configuration, DEFAULT_MAX_LINE_BYTES, InterruptPolicy};
pub use controller::{Controller, LifecycleState, RunOutcome, RunReport};
pub use error::{CutError, ReadError, TrimError};
pub use handoff::{ChannelState, HandoffReceiver, HandoffSender, handoff};
pub use profile::ProfileCapture;
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};
pub use signals::{InterruptListener, InterruptSource};
pub use sink::{OutputDestination, OutputTarget, SinkReport, SinkWriter};
pub use source::SourceReader;
pub use stats::StageStats;
pub use transform::Transformer;
pub use trim::{ByteTrim, EndBoundary, OverflowPolicy};
