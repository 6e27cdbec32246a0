//! Host collaborator interfaces
//!
//! The resolver and flattener never touch a concrete editing application.
//! They read a timeline through [`TimelineQuery`] and assemble their result
//! through [`TimelineEdit`] and [`EditTrack`]. [`crate::Timeline`] is the
//! in-memory implementation used by the CLI and by tests.

use crate::{ClipId, Frame, FrameRange, Result, SourceTime};

/// Read access to a placed clip instance
pub trait ClipView {
    fn id(&self) -> ClipId;

    fn is_enabled(&self) -> bool;

    /// Inclusive timeline interval covered by the clip
    fn timeline_range(&self) -> FrameRange;

    /// Maps a timeline frame to source time, including any trim or retime
    fn map_timeline_to_source(&self, time: Frame) -> SourceTime;

    /// Stack index of the track holding this clip
    fn owning_track(&self) -> usize;

    /// Independent copy that can be re-trimmed without touching `self`
    fn duplicate(&self) -> Self
    where
        Self: Sized;
}

/// Read access to a track
pub trait TrackView {
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool;

    /// Position in the stack; higher indices render on top
    fn stack_index(&self) -> usize;
}

/// Query surface of a timeline
pub trait TimelineQuery {
    type Clip: ClipView;
    type Track: TrackView;

    /// Length of the time axis; valid frames are `0..duration`
    fn duration(&self) -> Frame;

    /// Tracks from bottom (index 0) to top
    fn tracks_in_stack_order(&self) -> Vec<&Self::Track>;

    fn track(&self, index: usize) -> Option<&Self::Track>;

    fn clip(&self, id: ClipId) -> Option<&Self::Clip>;

    /// Every clip covering `time`, on enabled and disabled tracks alike
    fn clips_covering(&self, time: Frame) -> Vec<&Self::Clip>;
}

/// A track that is being built and is not yet part of a timeline
pub trait EditTrack {
    type Clip: ClipView;

    /// Places a clip on the track and returns the slot it occupies
    fn append(&mut self, clip: Self::Clip) -> usize;

    /// Trims the clip in `slot` down to `range`
    fn trim_to(&mut self, slot: usize, range: FrameRange) -> Result<()>;

    fn clip_at(&self, slot: usize) -> Option<&Self::Clip>;

    fn remove_all(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutation surface of a timeline, used only for final assembly
pub trait TimelineEdit: TimelineQuery {
    type NewTrack: EditTrack<Clip = Self::Clip>;

    /// Creates a detached track owned by the caller
    fn create_track(&self, name: &str) -> Self::NewTrack;

    /// Places a track on top of the stack and returns its index
    fn add_track(&mut self, track: Self::NewTrack) -> Result<usize>;

    fn set_track_enabled(&mut self, index: usize, enabled: bool) -> Result<()>;
}
