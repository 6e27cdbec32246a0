//! Occurrences: maximal runs of frames during which one clip is on top

use seqflat_core::{ClipId, Frame, FrameRange};
use std::collections::HashMap;

/// A contiguous stretch of frames during which `clip` is the visible clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub clip: ClipId,
    pub range: FrameRange,
}

impl Occurrence {
    pub fn first(&self) -> Frame {
        self.range.first()
    }

    pub fn last(&self) -> Frame {
        self.range.last()
    }
}

/// Occurrences grouped by clip, each group in order of first appearance.
///
/// Iteration order over clips is unspecified; use [`OccurrenceMap::in_time_order`]
/// when timeline order matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccurrenceMap {
    runs: HashMap<ClipId, Vec<FrameRange>>,
}

impl OccurrenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `clip` as visible at `time`.
    ///
    /// Frames must be recorded in ascending order. The clip's last run is
    /// extended when it ended on the previous frame, otherwise a new run starts.
    pub fn record(&mut self, clip: ClipId, time: Frame) {
        let runs = self.runs.entry(clip).or_default();
        match runs.last_mut() {
            Some(run) if time.checked_sub(1) == Some(run.last()) => run.include(time),
            _ => runs.push(FrameRange::single(time)),
        }
    }

    /// Runs recorded for `clip`, earliest first
    pub fn occurrences_of(&self, clip: ClipId) -> &[FrameRange] {
        self.runs.get(&clip).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates clips with their runs
    pub fn iter(&self) -> impl Iterator<Item = (ClipId, &[FrameRange])> {
        self.runs.iter().map(|(clip, runs)| (*clip, runs.as_slice()))
    }

    /// Every occurrence, sorted by first frame
    pub fn in_time_order(&self) -> Vec<Occurrence> {
        let mut occurrences: Vec<Occurrence> = self
            .runs
            .iter()
            .flat_map(|(clip, runs)| {
                runs.iter().map(|range| Occurrence {
                    clip: *clip,
                    range: *range,
                })
            })
            .collect();
        occurrences.sort_by_key(|occurrence| occurrence.first());
        occurrences
    }

    /// The clip visible at `time`, if any
    pub fn clip_at(&self, time: Frame) -> Option<ClipId> {
        self.runs
            .iter()
            .find(|(_, runs)| runs.iter().any(|range| range.contains(time)))
            .map(|(clip, _)| *clip)
    }

    /// Number of distinct clips with at least one occurrence
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn occurrence_count(&self) -> usize {
        self.runs.values().map(Vec::len).sum()
    }

    /// Total frames with a visible clip
    pub fn visible_frames(&self) -> u64 {
        self.runs
            .values()
            .flatten()
            .map(FrameRange::len)
            .sum()
    }
}
