//! Frame-by-frame visibility scan
//!
//! For every frame `t` in `[0, duration)` the resolver asks the timeline for
//! the clips covering `t`, drops disabled clips and clips on disabled tracks,
//! and keeps the one on the highest track. Disabled material is treated as
//! transparent. Offline media is not special-cased: an enabled clip with
//! missing media is still the visible clip.

use crate::{Error, OccurrenceMap, Result};
use seqflat_core::progress::percent_of;
use seqflat_core::{ClipView, Frame, Outcome, ProgressTask, TimelineQuery, TrackView};
use tracing::{debug, info};

/// Resolves which clip is visible at every frame of `timeline`.
///
/// Progress is reported after each frame, followed by a cancellation poll.
/// A cancelled scan returns [`Outcome::Cancelled`]; an `Outcome::Done` with an
/// empty map means nothing is visible.
pub fn resolve_visibility<T, P>(timeline: &T, progress: &mut P) -> Result<Outcome<OccurrenceMap>>
where
    T: TimelineQuery,
    P: ProgressTask + ?Sized,
{
    let duration = timeline.duration();
    let mut occurrences = OccurrenceMap::new();

    info!(
        duration,
        tracks = timeline.tracks_in_stack_order().len(),
        "Resolving visibility"
    );

    for t in 0..duration {
        if let Some(clip) = topmost_visible(timeline, t)? {
            occurrences.record(clip.id(), t);
        }

        progress.set_progress(percent_of(t, duration));
        if progress.is_cancelled() {
            info!(frame = t, "Visibility scan cancelled");
            return Ok(Outcome::Cancelled);
        }
    }

    info!(
        clips = occurrences.len(),
        occurrences = occurrences.occurrence_count(),
        visible_frames = occurrences.visible_frames(),
        "Visibility resolved"
    );

    Ok(Outcome::Done(occurrences))
}

/// The enabled clip on the highest enabled track covering `time`.
///
/// Stack indices are unique per track and a track never holds two clips at
/// the same frame, so there is never a tie.
pub fn topmost_visible<T: TimelineQuery>(timeline: &T, time: Frame) -> Result<Option<&T::Clip>> {
    let mut topmost: Option<(usize, &T::Clip)> = None;

    for clip in timeline.clips_covering(time) {
        if !clip.is_enabled() {
            continue;
        }

        let index = clip.owning_track();
        let track = timeline.track(index).ok_or(Error::UnknownTrack {
            clip: clip.id(),
            track: index,
        })?;
        if !track.is_enabled() {
            continue;
        }

        let rank = track.stack_index();
        if topmost.map_or(true, |(best, _)| rank > best) {
            topmost = Some((rank, clip));
        }
    }

    if let Some((rank, clip)) = topmost {
        debug!(frame = time, clip = %clip.id(), track = rank, "Visible clip");
    }

    Ok(topmost.map(|(_, clip)| clip))
}
