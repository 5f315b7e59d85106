//! Per-stage counters, returned by each stage when it ends.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub stage: &'static str,
    pub lines_in: u64,
    pub lines_out: u64,
    pub lines_skipped: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// Time spent doing the stage's own work, excluding channel waits.
    #[serde(rename = "busy_micros", serialize_with = "as_micros")]
    pub busy: Duration,
}

impl StageStats {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    pub(crate) fn record_in(&mut self, bytes: usize) {
        self.lines_in += 1;
        self.bytes_in += bytes as u64;
    }

    pub(crate) fn record_out(&mut self, bytes: usize) {
        self.lines_out += 1;
        self.bytes_out += bytes as u64;
    }
}

fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_micros().min(u64::MAX as u128) as u64)
}
