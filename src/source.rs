//! Source Reader: splits the input stream into lines.
//!
//! Lines end at `\n`; a `\r` right before it is dropped too, and a final
//! line without terminator still counts. A read error ends the input as if
//! EOF had been reached, keeping every line read before it.

use crate::Line;
use crate::error::ReadError;
use crate::handoff::HandoffSender;
use crate::shutdown::ShutdownSignal;
use crate::stats::StageStats;
use std::io::{BufRead, Read};
use std::time::Instant;
use tracing::{debug, error, info};

/// Initial scratch capacity; grows once for long lines and is then reused.
const SCRATCH_CAPACITY: usize = 64 * 1024;

pub struct SourceReader<R> {
    reader: R,
    max_line_len: usize,
    scratch: Vec<u8>,
    line_no: u64,
}

impl<R: BufRead> SourceReader<R> {
    pub fn new(reader: R, max_line_len: usize) -> Self {
        Self {
            reader,
            max_line_len,
            scratch: Vec::with_capacity(SCRATCH_CAPACITY.min(max_line_len.saturating_add(2))),
            line_no: 0,
        }
    }

    /// Read the next line. `Ok(None)` at end of input.
    pub fn read_line(&mut self) -> Result<Option<Line>, ReadError> {
        self.scratch.clear();
        // Room for the longest allowed line plus "\r\n".
        let limit = self.max_line_len.saturating_add(2) as u64;
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.scratch)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        if self.scratch.last() == Some(&b'\n') {
            self.scratch.pop();
        }
        if self.scratch.last() == Some(&b'\r') {
            self.scratch.pop();
        }
        if self.scratch.len() > self.max_line_len {
            return Err(ReadError::LineTooLong {
                line: self.line_no,
                limit: self.max_line_len,
            });
        }
        Ok(Some(Line::copy_from_slice(&self.scratch)))
    }

    /// Push every line into `lines`, then close it.
    pub fn run(mut self, lines: HandoffSender<Line>, shutdown: &ShutdownSignal) -> StageStats {
        let mut stats = StageStats::new("source");

        loop {
            if shutdown.is_triggered() {
                info!(lines = stats.lines_in, "shutdown requested; no more input is read");
                break;
            }

            let started = Instant::now();
            let next = self.read_line();
            stats.busy += started.elapsed();

            match next {
                Ok(Some(line)) => {
                    let len = line.len();
                    stats.record_in(len);
                    if lines.send(line).is_err() {
                        debug!("transformer stopped accepting lines");
                        break;
                    }
                    stats.record_out(len);
                }
                Ok(None) => {
                    debug!(lines = stats.lines_in, "end of input");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "reading standard input failed; treating as end of input");
                    break;
                }
            }
        }

        lines.close();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::handoff;
    use crate::shutdown::shutdown_channel;
    use std::io::{self, BufReader, Cursor};
    use std::thread;

    fn read_all(input: &[u8], max: usize) -> (Vec<Vec<u8>>, Option<ReadError>) {
        let mut reader = SourceReader::new(Cursor::new(input.to_vec()), max);
        let mut lines = Vec::new();
        loop {
            match reader.read_line() {
                Ok(Some(line)) => lines.push(line.to_vec()),
                Ok(None) => return (lines, None),
                Err(e) => return (lines, Some(e)),
            }
        }
    }

    /// Reader that yields its data, then fails.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::other("device unplugged")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_splits_on_newline() {
        let (lines, err) = read_all(b"one\ntwo\nthree\n", 1024);
        assert!(err.is_none());
        assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn test_final_line_without_newline() {
        let (lines, _) = read_all(b"one\ntwo", 1024);
        assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn test_strips_carriage_return() {
        let (lines, _) = read_all(b"dos\r\nunix\nlast\r", 1024);
        assert_eq!(lines, vec![b"dos".to_vec(), b"unix".to_vec(), b"last".to_vec()]);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        let (lines, _) = read_all(b"\n\nx\n", 1024);
        assert_eq!(lines, vec![Vec::new(), Vec::new(), b"x".to_vec()]);
    }

    #[test]
    fn test_empty_input_has_no_lines() {
        let (lines, err) = read_all(b"", 1024);
        assert!(lines.is_empty());
        assert!(err.is_none());
    }

    #[test]
    fn test_one_mebibyte_line_is_not_truncated() {
        let max = 1024 * 1024;
        let mut input = vec![b'x'; max];
        input.push(b'\n');
        input.extend_from_slice(b"next\n");
        let (lines, err) = read_all(&input, max);
        assert!(err.is_none());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), max);
        assert_eq!(lines[1], b"next");
    }

    #[test]
    fn test_line_at_limit_with_crlf_is_accepted() {
        let (lines, err) = read_all(b"abcd\r\n", 4);
        assert!(err.is_none());
        assert_eq!(lines, vec![b"abcd".to_vec()]);
    }

    #[test]
    fn test_overlong_line_is_an_error() {
        let (lines, err) = read_all(b"ok\nabcdefgh\nlater\n", 4);
        assert_eq!(lines, vec![b"ok".to_vec()]);
        match err {
            Some(ReadError::LineTooLong { line, limit }) => {
                assert_eq!(line, 2);
                assert_eq!(limit, 4);
            }
            other => panic!("expected LineTooLong, got {other:?}"),
        }
    }

    #[test]
    fn test_run_forwards_lines_and_closes() {
        let (tx, rx) = handoff("lines");
        let (_trigger, shutdown) = shutdown_channel();
        let reader = SourceReader::new(Cursor::new(b"a\nb\nc\n".to_vec()), 1024);
        let handle = thread::spawn(move || reader.run(tx, &shutdown));

        let got: Vec<Line> = std::iter::from_fn(|| rx.recv()).collect();
        let stats = handle.join().unwrap();
        assert_eq!(got, vec![Line::from("a"), Line::from("b"), Line::from("c")]);
        assert_eq!(stats.lines_in, 3);
        assert_eq!(stats.lines_out, 3);
        assert_eq!(stats.bytes_in, 3);
    }

    #[test]
    fn test_run_read_error_keeps_earlier_lines() {
        let failing = FailingReader {
            data: Cursor::new(b"first\nsecond\n".to_vec()),
        };
        let (tx, rx) = handoff("lines");
        let (_trigger, shutdown) = shutdown_channel();
        let reader = SourceReader::new(BufReader::new(failing), 1024);
        let handle = thread::spawn(move || reader.run(tx, &shutdown));

        let got: Vec<Line> = std::iter::from_fn(|| rx.recv()).collect();
        let stats = handle.join().unwrap();
        assert_eq!(got, vec![Line::from("first"), Line::from("second")]);
        assert_eq!(stats.lines_out, 2);
    }

    #[test]
    fn test_run_stops_when_shutdown_already_triggered() {
        let (tx, rx) = handoff::<Line>("lines");
        let (trigger, shutdown) = shutdown_channel();
        trigger.trigger();

        let reader = SourceReader::new(Cursor::new(b"never\n".to_vec()), 1024);
        let stats = reader.run(tx, &shutdown);
        assert_eq!(stats.lines_in, 0);
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn test_run_stops_when_consumer_gone() {
        let (tx, rx) = handoff::<Line>("lines");
        drop(rx);
        let (_trigger, shutdown) = shutdown_channel();
        let reader = SourceReader::new(Cursor::new(b"a\nb\n".to_vec()), 1024);
        let stats = reader.run(tx, &shutdown);
        assert_eq!(stats.lines_in, 1);
        assert_eq!(stats.lines_out, 0);
    }
}
