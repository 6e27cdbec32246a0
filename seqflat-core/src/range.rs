//! Discrete timeline time and inclusive frame ranges

use crate::{Error, Result};
use std::fmt;
use std::ops::RangeInclusive;

/// A discrete timeline time unit
pub type Frame = u64;

/// Time within the source media, in frames. Fractional once a clip is retimed.
pub type SourceTime = f64;

/// An inclusive interval of timeline frames, `[first, last]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameRange {
    first: Frame,
    last: Frame,
}

impl FrameRange {
    /// Creates a new range, rejecting `last < first`
    pub fn new(first: Frame, last: Frame) -> Result<Self> {
        if last < first {
            return Err(Error::InvalidRange { first, last });
        }
        Ok(Self { first, last })
    }

    /// A range covering exactly one frame
    pub fn single(frame: Frame) -> Self {
        Self {
            first: frame,
            last: frame,
        }
    }

    /// First frame in the range
    pub fn first(&self) -> Frame {
        self.first
    }

    /// Last frame in the range (inclusive)
    pub fn last(&self) -> Frame {
        self.last
    }

    /// Number of frames covered
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }

    /// Always false, a range holds at least one frame
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, frame: Frame) -> bool {
        frame >= self.first && frame <= self.last
    }

    pub fn contains_range(&self, other: &FrameRange) -> bool {
        other.first >= self.first && other.last <= self.last
    }

    pub fn overlaps(&self, other: &FrameRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// Grows the range just enough to cover `frame`
    pub fn include(&mut self, frame: Frame) {
        self.first = self.first.min(frame);
        self.last = self.last.max(frame);
    }

    /// Iterates every frame in the range
    pub fn iter(&self) -> RangeInclusive<Frame> {
        self.first..=self.last
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.first <= self.last
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}
