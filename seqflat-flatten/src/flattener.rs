//! Track assembly from resolved occurrences

use crate::{Error, FlattenConfig, Result, ANALYSIS_TITLE, ASSEMBLY_TITLE};
use seqflat_core::progress::percent_of;
use seqflat_core::{
    ClipView, EditTrack, FrameRange, Outcome, ProgressHost, ProgressTask, SourceTime,
    TimelineEdit,
};
use seqflat_resolver::{resolve_visibility, OccurrenceMap};
use tracing::{debug, info};

/// Name of the detached track used to trim one occurrence at a time
pub const SCRATCH_TRACK_NAME: &str = "Scratch";

/// Source time drift tolerated after a trim, absolute near zero and
/// relative to the source time beyond that
const ABSOLUTE_TOLERANCE: f64 = 1e-6;
const RELATIVE_TOLERANCE: f64 = 1e-13;

/// Builds a single track holding one trimmed clip per occurrence
pub struct Flattener {
    config: FlattenConfig,
}

impl Flattener {
    /// Creates a new flattener with the given configuration
    pub fn new(config: FlattenConfig) -> Self {
        Self { config }
    }

    /// Builds the flattened track for `timeline` from its resolved occurrences.
    ///
    /// Progress is reported once per clip identity and cancellation is polled
    /// right after. Cancelling drops every clip cut so far; the timeline is
    /// never modified here.
    pub fn flatten<T, P>(
        &self,
        timeline: &T,
        occurrences: &OccurrenceMap,
        progress: &mut P,
    ) -> Result<Outcome<T::NewTrack>>
    where
        T: TimelineEdit,
        P: ProgressTask + ?Sized,
    {
        let total = occurrences.len() as u64;
        let mut scratch = timeline.create_track(SCRATCH_TRACK_NAME);
        let mut pieces = Vec::with_capacity(occurrences.occurrence_count());

        info!(
            clips = total,
            occurrences = occurrences.occurrence_count(),
            track = %self.config.track_name,
            "Flattening timeline"
        );

        for (processed, (clip_id, runs)) in occurrences.iter().enumerate() {
            let original = timeline.clip(clip_id).ok_or(Error::UnknownClip(clip_id))?;

            for range in runs {
                pieces.push(cut_occurrence(original, *range, &mut scratch)?);
            }

            progress.set_progress(percent_of(processed as u64 + 1, total));
            if progress.is_cancelled() {
                info!(processed = processed + 1, total, "Flatten cancelled");
                return Ok(Outcome::Cancelled);
            }
        }

        pieces.sort_by_key(|piece| piece.timeline_range().first());

        let mut output = timeline.create_track(&self.config.track_name);
        for piece in pieces {
            output.append(piece);
        }

        info!(clips = output.len(), "Flattened track assembled");
        Ok(Outcome::Done(output))
    }
}

/// Resolves and flattens `timeline` in one pass, opening one progress task
/// for the analysis and one for the assembly.
pub fn flatten_timeline<T, H>(
    timeline: &T,
    progress: &H,
    config: &FlattenConfig,
) -> Result<Outcome<T::NewTrack>>
where
    T: TimelineEdit,
    H: ProgressHost,
{
    let mut analysis = progress.begin(ANALYSIS_TITLE);
    let occurrences = match resolve_visibility(timeline, &mut analysis)? {
        Outcome::Done(occurrences) => occurrences,
        Outcome::Cancelled => return Ok(Outcome::Cancelled),
    };

    let mut assembly = progress.begin(ASSEMBLY_TITLE);
    Flattener::new(config.clone()).flatten(timeline, &occurrences, &mut assembly)
}

/// Cuts one occurrence out of `original` using the scratch track.
///
/// The scratch track holds a single clip while trimming and is empty again
/// on return, so occurrences of the same clip never see each other.
fn cut_occurrence<C, S>(original: &C, range: FrameRange, scratch: &mut S) -> Result<C>
where
    C: ClipView,
    S: EditTrack<Clip = C>,
{
    // Mapped against the untrimmed original so handles stay correct
    let source_in = original.map_timeline_to_source(range.first());
    let source_out = original.map_timeline_to_source(range.last());

    scratch.remove_all();
    let slot = scratch.append(original.duplicate());
    scratch.trim_to(slot, range)?;
    let piece = scratch
        .clip_at(slot)
        .ok_or(seqflat_core::Error::InvalidSlot(slot))?
        .duplicate();
    scratch.remove_all();

    check_mapping(&piece, range, source_in, source_out)?;

    debug!(
        clip = %original.id(),
        range = %range,
        source_in,
        source_out,
        "Cut occurrence"
    );
    Ok(piece)
}

fn check_mapping<C: ClipView>(
    piece: &C,
    expected: FrameRange,
    source_in: SourceTime,
    source_out: SourceTime,
) -> Result<()> {
    let actual = piece.timeline_range();
    if actual != expected {
        return Err(Error::TrimMismatch {
            clip: piece.id(),
            expected,
            actual,
        });
    }

    for (frame, wanted) in [(actual.first(), source_in), (actual.last(), source_out)] {
        let mapped = piece.map_timeline_to_source(frame);
        let tolerance = ABSOLUTE_TOLERANCE.max(RELATIVE_TOLERANCE * wanted.abs());
        if (mapped - wanted).abs() > tolerance {
            return Err(Error::MappingDrift {
                clip: piece.id(),
                frame,
                expected: wanted,
                actual: mapped,
            });
        }
    }

    Ok(())
}
