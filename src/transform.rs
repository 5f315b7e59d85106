//! Transformer: applies the configured [`ByteTrim`] to every line.

use crate::Line;
use crate::handoff::{HandoffReceiver, HandoffSender};
use crate::shutdown::ShutdownSignal;
use crate::stats::StageStats;
use crate::trim::ByteTrim;
use crossbeam_channel::select;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Transformer {
    trim: ByteTrim,
}

impl Transformer {
    pub fn new(trim: ByteTrim) -> Self {
        Self { trim }
    }

    /// Trim lines from `lines` into `trimmed` until `lines` closes or the
    /// shutdown fires, then close `trimmed`.
    ///
    /// A line already taken from `lines` is always forwarded (or skipped by
    /// policy) before the shutdown is honoured.
    pub fn run(
        &self,
        lines: HandoffReceiver<Line>,
        trimmed: HandoffSender<Line>,
        shutdown: &ShutdownSignal,
    ) -> StageStats {
        let mut stats = StageStats::new("transform");

        loop {
            let next = select! {
                recv(lines.as_receiver()) -> msg => {
                    let line = lines.observe(msg);
                    if line.is_none() {
                        debug!(lines = stats.lines_in, "line channel closed");
                    }
                    line
                }
                recv(shutdown.as_receiver()) -> _ => {
                    info!(lines = stats.lines_in, "shutdown requested; transformer stops accepting lines");
                    None
                }
            };
            let Some(line) = next else { break };
            stats.record_in(line.len());

            let started = Instant::now();
            let result = self.trim.apply(line);
            stats.busy += started.elapsed();

            match result {
                Ok(out) => {
                    let len = out.len();
                    if trimmed.send(out).is_err() {
                        warn!("sink stopped accepting lines");
                        break;
                    }
                    stats.record_out(len);
                }
                Err(e) => {
                    stats.lines_skipped += 1;
                    warn!(line = stats.lines_in, error = %e, "skipping line");
                }
            }
        }

        trimmed.close();
        stats
    }
}
