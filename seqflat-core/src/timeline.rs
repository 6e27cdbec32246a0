//! In-memory timeline: an ordered stack of tracks over a shared time axis

use crate::host::{ClipView, EditTrack, TimelineEdit, TimelineQuery, TrackView};
use crate::{ClipId, ClipInstance, Error, Frame, FrameRange, Result};
use std::collections::HashSet;
use tracing::debug;

/// A lane of non-overlapping clips, kept sorted by first frame
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default = "enabled_by_default"))]
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    clips: Vec<ClipInstance>,
    /// Position in the owning timeline's stack
    #[cfg_attr(feature = "serde", serde(skip))]
    index: usize,
}

#[cfg(feature = "serde")]
fn enabled_by_default() -> bool {
    true
}

impl Track {
    /// Creates an empty, enabled track
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            clips: Vec::new(),
            index: 0,
        }
    }

    /// Adds a clip and returns the track, for building timelines inline
    pub fn with_clip(mut self, clip: ClipInstance) -> Self {
        self.insert(clip);
        self
    }

    /// Sets the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn clips(&self) -> &[ClipInstance] {
        &self.clips
    }

    /// Inserts a clip at its position in time order and returns its slot
    pub fn insert(&mut self, mut clip: ClipInstance) -> usize {
        clip.track = self.index;
        let slot = self
            .clips
            .partition_point(|c| c.range.first() <= clip.range.first());
        self.clips.insert(slot, clip);
        slot
    }

    /// The clip covering `time`, if any
    pub fn clip_covering(&self, time: Frame) -> Option<&ClipInstance> {
        let after = self.clips.partition_point(|c| c.range.first() <= time);
        after
            .checked_sub(1)
            .map(|slot| &self.clips[slot])
            .filter(|clip| clip.range.contains(time))
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
        for clip in &mut self.clips {
            clip.track = index;
        }
    }
}

impl TrackView for Track {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn stack_index(&self) -> usize {
        self.index
    }
}

impl EditTrack for Track {
    type Clip = ClipInstance;

    fn append(&mut self, clip: ClipInstance) -> usize {
        self.insert(clip)
    }

    fn trim_to(&mut self, slot: usize, range: FrameRange) -> Result<()> {
        self.clips
            .get_mut(slot)
            .ok_or(Error::InvalidSlot(slot))?
            .trim_to(range)
    }

    fn clip_at(&self, slot: usize) -> Option<&ClipInstance> {
        self.clips.get(slot)
    }

    fn remove_all(&mut self) {
        self.clips.clear();
    }

    fn len(&self) -> usize {
        self.clips.len()
    }
}

/// A multi-track timeline. Track 0 is the bottom of the stack.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timeline {
    pub name: String,
    /// Length of the time axis in frames
    pub duration: Frame,
    #[cfg_attr(feature = "serde", serde(default))]
    tracks: Vec<Track>,
}

impl Timeline {
    /// Creates an empty timeline
    pub fn new(name: impl Into<String>, duration: Frame) -> Self {
        Self {
            name: name.into(),
            duration,
            tracks: Vec::new(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Places a track on top of the stack, assigning fresh ids to its clips.
    /// Returns the new track's stack index.
    ///
    /// Fails with [`Error::ClipIdsExhausted`] when the clips cannot all get
    /// an id above the highest one in use; the timeline is left unchanged.
    pub fn push_track(&mut self, mut track: Track) -> Result<usize> {
        let index = self.tracks.len();
        self.assign_clip_ids(&mut track)?;
        track.set_index(index);

        debug!(
            track = %track.name,
            index,
            clips = track.clips.len(),
            "Added track"
        );
        self.tracks.push(track);
        Ok(index)
    }

    /// Looks up a clip by display name
    pub fn find_clip(&self, name: &str) -> Option<&ClipInstance> {
        self.clips().find(|clip| clip.name == name)
    }

    /// Iterates every clip on every track, bottom track first
    pub fn clips(&self) -> impl Iterator<Item = &ClipInstance> {
        self.tracks.iter().flat_map(|track| track.clips.iter())
    }

    /// Checks the preconditions the resolver relies on: well-formed ranges
    /// inside `[0, duration)`, no overlaps within a track and unique clip ids.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for (index, track) in self.tracks.iter().enumerate() {
            for clip in &track.clips {
                if !clip.range.is_well_formed() {
                    return Err(Error::InvalidRange {
                        first: clip.range.first(),
                        last: clip.range.last(),
                    });
                }
                if clip.range.last() >= self.duration {
                    return Err(Error::ClipOutOfBounds {
                        clip: clip.id,
                        range: clip.range,
                        duration: self.duration,
                    });
                }
                if !seen.insert(clip.id) {
                    return Err(Error::DuplicateClipId(clip.id));
                }
            }

            for pair in track.clips.windows(2) {
                if pair[0].range.overlaps(&pair[1].range) {
                    return Err(Error::OverlappingClips {
                        track: index,
                        first: pair[0].id,
                        second: pair[1].id,
                    });
                }
            }
        }

        Ok(())
    }

    /// Restores stack indices and clip ordering after deserialization
    #[cfg(feature = "serde")]
    pub(crate) fn reindex(&mut self) {
        for (index, track) in self.tracks.iter_mut().enumerate() {
            track.clips.sort_by_key(|clip| clip.range.first());
            track.set_index(index);
        }
    }

    fn assign_clip_ids(&self, track: &mut Track) -> Result<()> {
        let mut last = self.clips().map(|clip| clip.id.0).max().unwrap_or(0);
        if track.clips.len() as u64 > u64::MAX - last {
            return Err(Error::ClipIdsExhausted { highest: ClipId(last) });
        }
        for clip in &mut track.clips {
            last += 1;
            clip.id = ClipId(last);
        }
        Ok(())
    }
}

impl TimelineQuery for Timeline {
    type Clip = ClipInstance;
    type Track = Track;

    fn duration(&self) -> Frame {
        self.duration
    }

    fn tracks_in_stack_order(&self) -> Vec<&Track> {
        self.tracks.iter().collect()
    }

    fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    fn clip(&self, id: ClipId) -> Option<&ClipInstance> {
        self.clips().find(|clip| clip.id() == id)
    }

    fn clips_covering(&self, time: Frame) -> Vec<&ClipInstance> {
        self.tracks
            .iter()
            .filter_map(|track| track.clip_covering(time))
            .collect()
    }
}

impl TimelineEdit for Timeline {
    type NewTrack = Track;

    fn create_track(&self, name: &str) -> Track {
        Track::new(name)
    }

    fn add_track(&mut self, track: Track) -> Result<usize> {
        self.push_track(track)
    }

    fn set_track_enabled(&mut self, index: usize, enabled: bool) -> Result<()> {
        let track = self
            .tracks
            .get_mut(index)
            .ok_or(Error::TrackNotFound(index))?;
        track.enabled = enabled;
        Ok(())
    }
}
