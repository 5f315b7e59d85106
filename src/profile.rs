//! Profile capture.
//!
//! Started before the pipeline runs and stopped when it ends. The capture
//! file is created up front so an unwritable path is caught as a
//! configuration error. On stop it receives a JSON document with wall time
//! and the counters of every stage that reported back.

use crate::error::CutError;
use crate::stats::StageStats;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct ProfileDocument<'a> {
    started_at_unix_ms: u128,
    wall_micros: u128,
    outcome: &'a str,
    stages: &'a [StageStats],
}

#[derive(Debug)]
pub struct ProfileCapture {
    path: PathBuf,
    file: File,
    started: Instant,
    started_at: SystemTime,
}

impl ProfileCapture {
    pub fn start(path: &Path) -> Result<Self, CutError> {
        let file = File::create(path).map_err(|source| CutError::OpenProfile {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "profile capture started");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            started: Instant::now(),
            started_at: SystemTime::now(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop the capture and write it out.
    pub fn stop(self, outcome: &str, stages: &[StageStats]) -> Result<(), CutError> {
        let doc = ProfileDocument {
            started_at_unix_ms: self
                .started_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            wall_micros: self.started.elapsed().as_micros(),
            outcome,
            stages,
        };

        let mut out = BufWriter::new(self.file);
        serde_json::to_writer_pretty(&mut out, &doc)?;
        out.write_all(b"\n")?;
        out.flush()?;
        debug!(path = %self.path.display(), "profile capture written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_writes_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let capture = ProfileCapture::start(&path).unwrap();
        assert!(path.exists());

        let mut stats = StageStats::new("sink");
        stats.record_in(5);
        stats.record_out(6);
        capture.stop("completed", &[stats]).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["outcome"], "completed");
        assert_eq!(doc["stages"][0]["stage"], "sink");
        assert_eq!(doc["stages"][0]["lines_in"], 1);
        assert_eq!(doc["stages"][0]["bytes_out"], 6);
        assert!(doc["stages"][0]["busy_micros"].is_u64());
    }

    #[test]
    fn test_start_fails_for_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("profile.json");
        let err = ProfileCapture::start(&path).unwrap_err();
        assert!(matches!(err, CutError::OpenProfile { .. }));
    }
}
