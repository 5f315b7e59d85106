//! Sink Writer: buffers trimmed lines into the output target.
//!
//! The target is opened once, before the pipeline starts. Every line is
//! written followed by `\n`. When the input channel closes the buffer is
//! flushed, the target is released, and the completion signal fires. Write
//! and flush failures are logged, never fatal.

use crate::Line;
use crate::error::CutError;
use crate::handoff::HandoffReceiver;
use crate::stats::StageStats;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Capacity of the sink's write buffer.
pub const WRITE_BUFFER_CAPACITY: usize = 64 * 1024;

/// Where output goes, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputDestination {
    #[default]
    Stdout,
    File(PathBuf),
}

impl OutputDestination {
    /// `-` selects standard output, anything else is a file path.
    pub fn parse(s: &str) -> Result<Self, CutError> {
        match s {
            "" => Err(CutError::Config("output destination must not be empty".into())),
            "-" => Ok(OutputDestination::Stdout),
            path => Ok(OutputDestination::File(PathBuf::from(path))),
        }
    }
}

impl fmt::Display for OutputDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDestination::Stdout => write!(f, "(stdout)"),
            OutputDestination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An opened output: the process's stdout or a created/truncated file.
#[derive(Debug)]
pub enum OutputTarget {
    Stdout(io::Stdout),
    File(File),
}

impl OutputTarget {
    pub fn open(dest: &OutputDestination) -> Result<Self, CutError> {
        match dest {
            OutputDestination::Stdout => Ok(OutputTarget::Stdout(io::stdout())),
            OutputDestination::File(path) => Self::create(path),
        }
    }

    fn create(path: &Path) -> Result<Self, CutError> {
        File::create(path)
            .map(OutputTarget::File)
            .map_err(|source| CutError::OpenOutput {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputTarget::Stdout(out) => out.write(buf),
            OutputTarget::File(file) => file.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(out) => out.write_all(buf),
            OutputTarget::File(file) => file.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(out) => out.flush(),
            OutputTarget::File(file) => file.flush(),
        }
    }
}

/// What the sink reports through the completion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub stats: StageStats,
    /// A write failed; later lines were drained and discarded.
    pub write_failed: bool,
    /// The final flush succeeded.
    pub flushed: bool,
}

pub struct SinkWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> SinkWriter<W> {
    pub fn new(target: W) -> Self {
        Self::with_capacity(WRITE_BUFFER_CAPACITY, target)
    }

    pub fn with_capacity(capacity: usize, target: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, target),
        }
    }

    /// Write every line from `trimmed`, flush, release the target and fire
    /// `completion`. The report is also returned.
    pub fn run(
        mut self,
        trimmed: HandoffReceiver<Line>,
        completion: oneshot::Sender<SinkReport>,
    ) -> SinkReport {
        let mut stats = StageStats::new("sink");
        let mut write_failed = false;

        while let Some(line) = trimmed.recv() {
            stats.record_in(line.len());
            if write_failed {
                stats.lines_skipped += 1;
                continue;
            }

            let started = Instant::now();
            let result = write_line(&mut self.writer, &line);
            stats.busy += started.elapsed();

            match result {
                Ok(()) => stats.record_out(line.len() + 1),
                Err(e) => {
                    write_failed = true;
                    stats.lines_skipped += 1;
                    if e.kind() == io::ErrorKind::BrokenPipe {
                        info!("output closed by the reader; discarding remaining lines");
                    } else {
                        error!(error = %e, "writing output failed; discarding remaining lines");
                    }
                }
            }
        }
        debug!(lines = stats.lines_out, "trimmed-line channel closed");

        let started = Instant::now();
        let flushed = match self.writer.flush() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "couldn't flush output");
                false
            }
        };
        stats.busy += started.elapsed();

        // Release the target without a second flush attempt from BufWriter's drop.
        let (target, _unflushed) = self.writer.into_parts();
        drop(target);

        let report = SinkReport {
            stats,
            write_failed,
            flushed,
        };
        if completion.send(report.clone()).is_err() {
            debug!("nobody is waiting for sink completion");
        }
        report
    }
}

fn write_line<W: Write>(writer: &mut W, line: &[u8]) -> io::Result<()> {
    writer.write_all(line)?;
    writer.write_all(b"\n")
}
