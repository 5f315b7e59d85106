//! Immutable run configuration.
//!
//! Built once before the pipeline starts (usually from [`crate::cli::Cli`])
//! and handed to the controller by value. Nothing mutates it afterwards.

use crate::error::CutError;
use crate::sink::{OutputDestination, WRITE_BUFFER_CAPACITY};
use crate::trim::ByteTrim;
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Longest accepted input line, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Reaction to SIGINT/SIGTERM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InterruptPolicy {
    /// Stop reading, flush what the pipeline already holds, then exit.
    #[default]
    Drain,
    /// Exit immediately; buffered output may be lost.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    trim: ByteTrim,
    output: OutputDestination,
    cpu_profile: Option<PathBuf>,
    interrupt_policy: InterruptPolicy,
    max_line_bytes: usize,
    sink_buffer_bytes: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            trim: ByteTrim::default(),
            output: OutputDestination::Stdout,
            cpu_profile: None,
            interrupt_policy: InterruptPolicy::Drain,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            sink_buffer_bytes: WRITE_BUFFER_CAPACITY,
        }
    }
}

impl Configuration {
    pub fn new(trim: ByteTrim, output: OutputDestination) -> Self {
        Self {
            trim,
            output,
            ..Self::default()
        }
    }

    pub fn with_cpu_profile(mut self, path: impl Into<PathBuf>) -> Self {
        self.cpu_profile = Some(path.into());
        self
    }

    pub fn with_interrupt_policy(mut self, policy: InterruptPolicy) -> Self {
        self.interrupt_policy = policy;
        self
    }

    pub fn with_max_line_bytes(mut self, max: usize) -> Result<Self, CutError> {
        if max == 0 {
            return Err(CutError::Config("maximum line length must be at least 1".into()));
        }
        self.max_line_bytes = max;
        Ok(self)
    }

    /// Capacity of the sink's write buffer; 0 writes every line through.
    pub fn with_sink_buffer_bytes(mut self, bytes: usize) -> Self {
        self.sink_buffer_bytes = bytes;
        self
    }

    pub fn trim(&self) -> ByteTrim {
        self.trim
    }

    pub fn output(&self) -> &OutputDestination {
        &self.output
    }

    pub fn cpu_profile(&self) -> Option<&Path> {
        self.cpu_profile.as_deref()
    }

    pub fn interrupt_policy(&self) -> InterruptPolicy {
        self.interrupt_policy
    }

    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    pub fn sink_buffer_bytes(&self) -> usize {
        self.sink_buffer_bytes
    }
}
