//! Bounds-checked byte trimming of a single line.
//!
//! A [`ByteTrim`] cuts `line[leading .. trailing]` out of every line. Zero
//! disables either side. Offsets that do not fit the line are resolved by
//! the [`OverflowPolicy`]: clamped to what is available, or reported as a
//! [`TrimError`] so the caller can skip the line.

use crate::Line;
use crate::error::TrimError;
use clap::ValueEnum;
use std::ops::Range;

/// What to do when an offset points past the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OverflowPolicy {
    /// Clamp offsets to the line; the line may come out empty.
    #[default]
    Clamp,
    /// Drop the line and report it.
    Skip,
}

/// Where the trailing offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EndBoundary {
    /// Offset into the original line: `line[leading..trailing]`.
    #[default]
    Line,
    /// Byte count kept after the leading trim: `line[leading..][..trailing]`.
    Remainder,
}

/// Leading/trailing trim settings, applied identically to every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteTrim {
    leading: usize,
    trailing: usize,
    boundary: EndBoundary,
    policy: OverflowPolicy,
}

impl ByteTrim {
    pub fn new(leading: usize, trailing: usize) -> Self {
        Self {
            leading,
            trailing,
            ..Self::default()
        }
    }

    pub fn with_boundary(mut self, boundary: EndBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn leading(&self) -> usize {
        self.leading
    }

    pub fn trailing(&self) -> usize {
        self.trailing
    }

    pub fn boundary(&self) -> EndBoundary {
        self.boundary
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// True when both offsets are zero and lines pass through untouched.
    pub fn is_identity(&self) -> bool {
        self.leading == 0 && self.trailing == 0
    }

    /// Compute the byte range kept from a line of `len` bytes.
    ///
    /// Never returns a range outside `0..len`.
    pub fn range(&self, len: usize) -> Result<Range<usize>, TrimError> {
        let end = match (self.trailing, self.boundary) {
            (0, _) => len,
            (trailing, EndBoundary::Line) => trailing,
            (trailing, EndBoundary::Remainder) => self.leading.saturating_add(trailing),
        };

        match self.policy {
            OverflowPolicy::Clamp => {
                let start = self.leading.min(len);
                let end = end.min(len).max(start);
                Ok(start..end)
            }
            OverflowPolicy::Skip => {
                if self.leading > len {
                    return Err(TrimError::LeadingOutOfRange {
                        leading: self.leading,
                        len,
                    });
                }
                if end > len {
                    return Err(TrimError::TrailingOutOfRange { end, len });
                }
                if end < self.leading {
                    return Err(TrimError::InvertedRange {
                        start: self.leading,
                        end,
                    });
                }
                Ok(self.leading..end)
            }
        }
    }

    /// Trim a line. The result shares the original allocation.
    pub fn apply(&self, line: Line) -> Result<Line, TrimError> {
        if self.is_identity() {
            return Ok(line);
        }
        let range = self.range(line.len())?;
        Ok(line.slice(range))
    }
}
