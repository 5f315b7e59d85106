//! Error types.
//!
//! Only [`CutError`] ever leaves the library. The per-line and per-read
//! errors are handled inside the stage that produced them and never cross a
//! channel.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: setup failures and broken pipeline tasks.
#[derive(Debug, Error)]
pub enum CutError {
    #[error("could not open '{}' for writing: {source}", .path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not create profile file '{}': {source}", .path.display())]
    OpenProfile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to install interrupt handler: {0}")]
    Signal(#[source] io::Error),

    #[error("pipeline stage '{0}' terminated abnormally")]
    StageFailed(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("profile serialization error: {0}")]
    Profile(#[from] serde_json::Error),
}

/// A trim offset that does not fit inside the line it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrimError {
    #[error("leading offset {leading} exceeds line length {len}")]
    LeadingOutOfRange { leading: usize, len: usize },

    #[error("end boundary {end} exceeds line length {len}")]
    TrailingOutOfRange { end: usize, len: usize },

    #[error("end boundary {end} lies before start offset {start}")]
    InvertedRange { start: usize, end: usize },
}

/// Errors raised while splitting the input into lines.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("line {line} is longer than {limit} bytes")]
    LineTooLong { line: u64, limit: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}
