//! Lifecycle Controller: wires the three stages and owns shutdown.
//!
//! ```text
//! source ──lines──▶ transform ──trimmed──▶ sink ──completion──▶ controller
//! ```
//!
//! All three stages run on blocking worker threads. The Source Reader gets
//! a thread of its own rather than the controller's flow of control so the
//! controller stays free to wait on the sink's completion and on interrupts
//! at the same time; a read parked on stdin can then never hold up either.
//! Shutdown is a strict cascade: the source closes `lines`, the transformer
//! closes `trimmed`, the sink flushes and signals completion.
//!
//! An interrupt moves the controller from `Running` to `Interrupted`. Under
//! [`InterruptPolicy::Drain`] the shutdown signal is raised, the stages stop
//! taking new input, and everything already accepted is flushed before the
//! run ends. A second interrupt during the drain abandons it. Under
//! [`InterruptPolicy::Abort`] the run ends at once and in-flight lines are
//! abandoned. A completion that is already available when the interrupt is
//! seen wins over it.

use crate::Line;
use crate::config::{Configuration, InterruptPolicy};
use crate::error::CutError;
use crate::handoff::handoff;
use crate::profile::ProfileCapture;
use crate::shutdown::shutdown_channel;
use crate::signals::InterruptSource;
use crate::sink::{SinkReport, SinkWriter};
use crate::source::SourceReader;
use crate::stats::StageStats;
use crate::transform::Transformer;
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Interrupted,
    Terminated,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Input was exhausted and the pipeline drained.
    Completed,
    /// Interrupted; everything the pipeline held was flushed.
    Drained,
    /// Interrupted under fast-abort; in-flight output was abandoned.
    Aborted,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Drained => "drained",
            RunOutcome::Aborted => "aborted",
        }
    }

    /// Process exit status for this outcome (128 + SIGINT after an interrupt).
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::Drained | RunOutcome::Aborted => 130,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Counters of every stage that reported back.
    pub stages: Vec<StageStats>,
    /// `None` after a fast abort.
    pub sink: Option<SinkReport>,
    pub elapsed: Duration,
}

impl RunReport {
    fn stage(&self, name: &str) -> Option<&StageStats> {
        self.stages.iter().find(|s| s.stage == name)
    }

    pub fn lines_read(&self) -> u64 {
        self.stage("source").map_or(0, |s| s.lines_in)
    }

    pub fn lines_skipped(&self) -> u64 {
        self.stage("transform").map_or(0, |s| s.lines_skipped)
    }

    pub fn lines_written(&self) -> u64 {
        self.sink.as_ref().map_or(0, |s| s.stats.lines_out)
    }

    pub fn bytes_written(&self) -> u64 {
        self.sink.as_ref().map_or(0, |s| s.stats.bytes_out)
    }
}

pub struct Controller {
    config: Configuration,
    state: LifecycleState,
}

impl Controller {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            state: LifecycleState::Running,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Run the pipeline from `input` into `target` until the input is
    /// exhausted or `interrupts` reports an interrupt.
    ///
    /// `target` must already be open; opening it is the caller's fatal-error
    /// boundary.
    pub async fn run<R, W, I>(
        &mut self,
        input: R,
        target: W,
        mut interrupts: I,
    ) -> Result<RunReport, CutError>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
        I: InterruptSource,
    {
        let started = Instant::now();
        let profile = self
            .config
            .cpu_profile()
            .map(ProfileCapture::start)
            .transpose()?;

        let (trigger, shutdown) = shutdown_channel();
        let (line_tx, line_rx) = handoff::<Line>("lines");
        let (trimmed_tx, trimmed_rx) = handoff::<Line>("trimmed");
        let (done_tx, mut done_rx) = oneshot::channel::<SinkReport>();

        let transformer = Transformer::new(self.config.trim());
        let transform_shutdown = shutdown.clone();
        let transform_task = task::spawn_blocking(move || {
            transformer.run(line_rx, trimmed_tx, &transform_shutdown)
        });

        let sink = SinkWriter::with_capacity(self.config.sink_buffer_bytes(), target);
        let sink_task = task::spawn_blocking(move || sink.run(trimmed_rx, done_tx));

        let source = SourceReader::new(input, self.config.max_line_bytes());
        let source_task = task::spawn_blocking(move || source.run(line_tx, &shutdown));

        let trim = self.config.trim();
        info!(
            leading_bytes = trim.leading(),
            trailing_bytes = trim.trailing(),
            boundary = ?trim.boundary(),
            policy = ?trim.policy(),
            output = %self.config.output(),
            "pipeline started"
        );

        let first = tokio::select! {
            biased;
            report = &mut done_rx => Some(report),
            () = interrupts.interrupted() => None,
        };
        // Completion that raced the interrupt still counts as completion.
        let completed = first.or_else(|| done_rx.try_recv().ok().map(Ok));

        let (outcome, mut stages, sink_report) = match completed {
            Some(report) => {
                let report = report.map_err(|_| CutError::StageFailed("sink"))?;
                let source = join_stage(source_task, "source").await?;
                let transform = join_stage(transform_task, "transform").await?;
                join_stage(sink_task, "sink").await?;
                (RunOutcome::Completed, vec![source, transform], report)
            }
            None => {
                self.state = LifecycleState::Interrupted;
                match self.config.interrupt_policy() {
                    InterruptPolicy::Abort => {
                        warn!("fast abort requested; in-flight output is discarded");
                        return Ok(self.abandon(profile, started));
                    }
                    InterruptPolicy::Drain => {
                        info!("draining pipeline before exit; interrupt again to abort");
                        trigger.trigger();
                        let report = tokio::select! {
                            biased;
                            report = &mut done_rx => {
                                report.map_err(|_| CutError::StageFailed("sink"))?
                            }
                            () = interrupts.interrupted() => {
                                warn!("interrupted again while draining; in-flight output is discarded");
                                return Ok(self.abandon(profile, started));
                            }
                        };
                        let transform = join_stage(transform_task, "transform").await?;
                        join_stage(sink_task, "sink").await?;
                        // The source may be blocked on a read that never
                        // returns; it is left behind.
                        if source_task.is_finished() {
                            let source = join_stage(source_task, "source").await?;
                            (RunOutcome::Drained, vec![source, transform], report)
                        } else {
                            debug!("source still blocked on input; not waiting for it");
                            (RunOutcome::Drained, vec![transform], report)
                        }
                    }
                }
            }
        };
        stages.push(sink_report.stats.clone());
        self.state = LifecycleState::Terminated;

        let report = RunReport {
            outcome,
            stages,
            sink: Some(sink_report),
            elapsed: started.elapsed(),
        };
        info!(
            outcome = outcome.as_str(),
            lines_read = report.lines_read(),
            lines_written = report.lines_written(),
            lines_skipped = report.lines_skipped(),
            bytes_written = report.bytes_written(),
            elapsed = ?report.elapsed,
            "pipeline finished"
        );

        if let Some(profile) = profile {
            stop_profile(profile, outcome, &report.stages);
        }
        Ok(report)
    }

    /// End the run without waiting for the stages.
    fn abandon(&mut self, profile: Option<ProfileCapture>, started: Instant) -> RunReport {
        if let Some(profile) = profile {
            stop_profile(profile, RunOutcome::Aborted, &[]);
        }
        self.state = LifecycleState::Terminated;
        RunReport {
            outcome: RunOutcome::Aborted,
            stages: Vec::new(),
            sink: None,
            elapsed: started.elapsed(),
        }
    }
}

async fn join_stage<T>(handle: JoinHandle<T>, stage: &'static str) -> Result<T, CutError> {
    handle.await.map_err(|e| {
        error!(stage, error = %e, "pipeline stage failed");
        CutError::StageFailed(stage)
    })
}

fn stop_profile(profile: ProfileCapture, outcome: RunOutcome, stages: &[StageStats]) {
    let path = profile.path().to_path_buf();
    if let Err(e) = profile.stop(outcome.as_str(), stages) {
        warn!(path = %path.display(), error = %e, "couldn't write profile capture");
    }
}
