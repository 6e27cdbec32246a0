//! Clip instances and the timeline-to-source mapping they carry

use crate::host::ClipView;
use crate::{Error, Frame, FrameRange, Result, SourceTime};
use std::fmt;

/// Stable identity of a clip instance within a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A placed reference to source media on a track
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClipInstance {
    /// Identity assigned by the timeline on placement
    pub id: ClipId,
    /// Display name
    pub name: String,
    /// Source media reference (path, reel or asset name)
    pub media: String,
    /// Timeline frames covered by this clip
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub range: FrameRange,
    /// Source time shown at `range.first()`
    pub source_in: SourceTime,
    /// Source frames advanced per timeline frame (negative plays in reverse)
    #[cfg_attr(feature = "serde", serde(default = "unit_speed"))]
    pub speed: f64,
    #[cfg_attr(feature = "serde", serde(default = "enabled_by_default"))]
    pub enabled: bool,
    /// Clip this instance was duplicated from, if any
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub derived_from: Option<ClipId>,
    /// Stack index of the owning track
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) track: usize,
}

#[cfg(feature = "serde")]
fn unit_speed() -> f64 {
    1.0
}

#[cfg(feature = "serde")]
fn enabled_by_default() -> bool {
    true
}

impl ClipInstance {
    /// Creates an enabled clip playing at normal speed.
    ///
    /// The id is provisional until the clip's track is added to a timeline.
    pub fn new(
        name: impl Into<String>,
        media: impl Into<String>,
        range: FrameRange,
        source_in: SourceTime,
    ) -> Self {
        Self {
            id: ClipId(0),
            name: name.into(),
            media: media.into(),
            range,
            source_in,
            speed: 1.0,
            enabled: true,
            derived_from: None,
            track: 0,
        }
    }

    /// Sets the playback speed
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Source time shown at the given timeline frame
    pub fn source_time_at(&self, time: Frame) -> SourceTime {
        let offset = time as f64 - self.range.first() as f64;
        self.source_in + offset * self.speed
    }

    /// Shrinks the clip to `range`, keeping the source mapping of the retained frames.
    pub fn trim_to(&mut self, range: FrameRange) -> Result<()> {
        if !self.range.contains_range(&range) {
            return Err(Error::TrimOutOfRange {
                clip: self.id,
                current: self.range,
                requested: range,
            });
        }

        self.source_in = self.source_time_at(range.first());
        self.range = range;
        Ok(())
    }

    /// Source time shown on the last frame of the clip
    pub fn source_out(&self) -> SourceTime {
        self.source_time_at(self.range.last())
    }
}

impl ClipView for ClipInstance {
    fn id(&self) -> ClipId {
        self.id
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn timeline_range(&self) -> FrameRange {
        self.range
    }

    fn map_timeline_to_source(&self, time: Frame) -> SourceTime {
        self.source_time_at(time)
    }

    fn owning_track(&self) -> usize {
        self.track
    }

    fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.derived_from = Some(self.derived_from.unwrap_or(self.id));
        copy
    }
}
