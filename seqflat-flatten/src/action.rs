//! User-invokable "Flatten Sequence" action

use crate::{flatten_timeline, ContextMenuRegistry, FlattenConfig, MenuContext, Result};
use seqflat_core::{EditTrack, Outcome, ProgressHost, TimelineEdit, TrackView};
use tracing::{debug, info, warn};

/// Title shown in host context menus
pub const ACTION_TITLE: &str = "Flatten Sequence";

/// What a trigger did to the active timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Nothing was focused; nothing happened
    NoActiveTimeline,
    /// The user cancelled; the timeline is unchanged
    Cancelled,
    /// A flattened track was added on top of the stack
    Flattened {
        track_index: usize,
        clip_count: usize,
        hidden_tracks: Vec<usize>,
    },
}

/// Flattens the active timeline into a new track on top of it.
///
/// The action holds only its configuration; hosts construct it and register
/// it explicitly with [`FlattenAction::register`].
#[derive(Debug, Clone, Default)]
pub struct FlattenAction {
    config: FlattenConfig,
}

impl FlattenAction {
    pub fn new(config: FlattenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Adds the action to the timeline and spreadsheet context menus
    pub fn register(&self, registry: &mut ContextMenuRegistry) {
        for context in [MenuContext::Timeline, MenuContext::Spreadsheet] {
            registry.register(context, ACTION_TITLE);
        }
    }

    /// Runs the action against the active timeline, if there is one.
    ///
    /// The timeline is only touched after both passes completed: when
    /// configured, every track that existed before is disabled and the
    /// flattened track is added on top. A cancelled run leaves it as it was,
    /// and so does a failed edit: tracks already disabled are restored.
    pub fn trigger<T, H>(&self, active: Option<&mut T>, progress: &H) -> Result<ActionOutcome>
    where
        T: TimelineEdit,
        H: ProgressHost,
    {
        let Some(timeline) = active else {
            debug!("No active timeline, nothing to flatten");
            return Ok(ActionOutcome::NoActiveTimeline);
        };

        let source_tracks: Vec<(usize, bool)> = timeline
            .tracks_in_stack_order()
            .into_iter()
            .map(|track| (track.stack_index(), track.is_enabled()))
            .collect();

        let track = match flatten_timeline(&*timeline, progress, &self.config)? {
            Outcome::Done(track) => track,
            Outcome::Cancelled => return Ok(ActionOutcome::Cancelled),
        };
        let clip_count = track.len();

        let mut hidden_tracks = Vec::new();
        if self.config.hide_source_tracks {
            for &(index, _) in &source_tracks {
                if let Err(err) = timeline.set_track_enabled(index, false) {
                    restore_tracks(timeline, &source_tracks[..hidden_tracks.len()]);
                    return Err(err.into());
                }
                hidden_tracks.push(index);
            }
        }

        let track_index = match timeline.add_track(track) {
            Ok(index) => index,
            Err(err) => {
                restore_tracks(timeline, &source_tracks[..hidden_tracks.len()]);
                return Err(err.into());
            }
        };

        info!(
            track = %self.config.track_name,
            track_index,
            clip_count,
            hidden = hidden_tracks.len(),
            "Timeline flattened"
        );

        Ok(ActionOutcome::Flattened {
            track_index,
            clip_count,
            hidden_tracks,
        })
    }
}

/// Puts tracks back to the enabled state captured before the edit
fn restore_tracks<T: TimelineEdit>(timeline: &mut T, tracks: &[(usize, bool)]) {
    for &(index, enabled) in tracks {
        if let Err(err) = timeline.set_track_enabled(index, enabled) {
            warn!(index, error = %err, "Failed to restore track state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ANALYSIS_TITLE, ASSEMBLY_TITLE};
    use seqflat_core::{
        CancelFlag, ClipId, ClipInstance, ClipView, Frame, FrameRange, NoProgress, ProgressTask,
        Timeline, TimelineQuery, Track, TrackerHost,
    };
    use seqflat_core::document::read_timeline;
    use std::cell::RefCell;
    use std::io::Cursor;

    fn clip(name: &str, first: Frame, last: Frame, source_in: f64) -> ClipInstance {
        ClipInstance::new(
            name,
            format!("{name}.mov"),
            FrameRange::new(first, last).unwrap(),
            source_in,
        )
    }

    fn layered_timeline() -> Timeline {
        let mut timeline = Timeline::new("edit", 10);
        timeline.push_track(Track::new("V1").with_clip(clip("X", 0, 9, 1000.0))).unwrap();
        timeline.push_track(Track::new("V2").with_clip(clip("Y", 3, 6, 50.0))).unwrap();
        timeline
    }

    #[test]
    fn test_trigger_adds_flattened_track_and_hides_sources() {
        let mut timeline = layered_timeline();
        let x = timeline.find_clip("X").unwrap().id;
        let y = timeline.find_clip("Y").unwrap().id;

        let outcome = FlattenAction::default()
            .trigger(Some(&mut timeline), &NoProgress)
            .unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::Flattened {
                track_index: 2,
                clip_count: 3,
                hidden_tracks: vec![0, 1],
            }
        );

        let tracks = timeline.tracks();
        assert_eq!(tracks.len(), 3);
        assert!(!tracks[0].is_enabled());
        assert!(!tracks[1].is_enabled());
        assert!(tracks[2].is_enabled());
        assert_eq!(tracks[2].name(), "Flattened");

        let flattened = tracks[2].clips();
        let origins: Vec<_> = flattened.iter().map(|c| c.derived_from).collect();
        assert_eq!(origins, vec![Some(x), Some(y), Some(x)]);

        // Placed clips get identities of their own
        assert!(flattened.iter().all(|c| c.id != x && c.id != y));
        assert!(flattened.iter().all(|c| c.owning_track() == 2));
        assert!(timeline.validate().is_ok());

        // The flattened track alone now shows what the stack showed
        assert_eq!(timeline.clips_covering(8).len(), 2);
        assert_eq!(flattened[2].map_timeline_to_source(8), 1008.0);
    }

    #[test]
    fn test_keep_source_tracks() {
        let mut timeline = layered_timeline();
        let action = FlattenAction::new(FlattenConfig {
            track_name: "Conform".to_string(),
            hide_source_tracks: false,
        });

        let outcome = action.trigger(Some(&mut timeline), &NoProgress).unwrap();

        assert!(matches!(
            outcome,
            ActionOutcome::Flattened { ref hidden_tracks, .. } if hidden_tracks.is_empty()
        ));
        assert!(timeline.tracks().iter().all(|track| track.enabled));
        assert_eq!(timeline.tracks()[2].name, "Conform");
    }

    #[test]
    fn test_no_active_timeline_is_a_noop() {
        let outcome = FlattenAction::default()
            .trigger::<Timeline, _>(None, &NoProgress)
            .unwrap();

        assert_eq!(outcome, ActionOutcome::NoActiveTimeline);
    }

    #[test]
    fn test_cancel_leaves_timeline_untouched() {
        let mut timeline = layered_timeline();
        let before = timeline.clone();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let progress = TrackerHost::new(cancel);

        let outcome = FlattenAction::default()
            .trigger(Some(&mut timeline), &progress)
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(timeline, before);
    }

    /// Lets analysis finish, then cancels assembly
    #[derive(Default)]
    struct CancelAssembly {
        begun: RefCell<Vec<String>>,
    }

    struct PhaseTask {
        cancelled: bool,
    }

    impl ProgressTask for PhaseTask {
        fn set_progress(&mut self, _percent: u8) {}

        fn is_cancelled(&self) -> bool {
            self.cancelled
        }
    }

    impl ProgressHost for CancelAssembly {
        type Task = PhaseTask;

        fn begin(&self, title: &str) -> PhaseTask {
            self.begun.borrow_mut().push(title.to_string());
            PhaseTask {
                cancelled: title == ASSEMBLY_TITLE,
            }
        }
    }

    #[test]
    fn test_cancel_during_assembly_leaves_timeline_untouched() {
        let mut timeline = layered_timeline();
        let before = timeline.clone();
        let progress = CancelAssembly::default();

        let outcome = FlattenAction::default()
            .trigger(Some(&mut timeline), &progress)
            .unwrap();

        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(*progress.begun.borrow(), vec![ANALYSIS_TITLE, ASSEMBLY_TITLE]);
        assert_eq!(timeline, before);
    }

    /// Timeline whose host refuses to toggle one track
    struct RefusingHost {
        timeline: Timeline,
        refused: usize,
    }

    impl TimelineQuery for RefusingHost {
        type Clip = ClipInstance;
        type Track = Track;

        fn duration(&self) -> Frame {
            self.timeline.duration()
        }

        fn tracks_in_stack_order(&self) -> Vec<&Track> {
            self.timeline.tracks_in_stack_order()
        }

        fn track(&self, index: usize) -> Option<&Track> {
            self.timeline.track(index)
        }

        fn clip(&self, id: ClipId) -> Option<&ClipInstance> {
            self.timeline.clip(id)
        }

        fn clips_covering(&self, time: Frame) -> Vec<&ClipInstance> {
            self.timeline.clips_covering(time)
        }
    }

    impl TimelineEdit for RefusingHost {
        type NewTrack = Track;

        fn create_track(&self, name: &str) -> Track {
            self.timeline.create_track(name)
        }

        fn add_track(&mut self, track: Track) -> seqflat_core::Result<usize> {
            self.timeline.add_track(track)
        }

        fn set_track_enabled(&mut self, index: usize, enabled: bool) -> seqflat_core::Result<()> {
            if index == self.refused {
                return Err(seqflat_core::Error::TrackNotFound(index));
            }
            self.timeline.set_track_enabled(index, enabled)
        }
    }

    #[test]
    fn test_failed_hide_restores_tracks() {
        let mut timeline = layered_timeline();
        timeline.set_track_enabled(0, false).unwrap();
        timeline
            .push_track(Track::new("V3").with_clip(clip("Z", 8, 9, 0.0)))
            .unwrap();
        let before = timeline.clone();
        let mut host = RefusingHost {
            timeline,
            refused: 2,
        };

        let err = FlattenAction::default()
            .trigger(Some(&mut host), &NoProgress)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Core(seqflat_core::Error::TrackNotFound(2))
        ));
        // Track 0 stays disabled, track 1 is enabled again, nothing was added
        assert_eq!(host.timeline, before);
    }

    #[test]
    fn test_exhausted_clip_ids_leave_timeline_untouched() {
        let document = r#"{
            "name": "reel 1",
            "duration": 10,
            "tracks": [
                { "name": "V1", "clips": [
                    { "id": 1, "name": "X", "media": "x.mov", "first": 0, "last": 9, "source_in": 1000.0 }
                ] },
                { "name": "V2", "clips": [
                    { "id": 18446744073709551615, "name": "Y", "media": "y.mov", "first": 3, "last": 6, "source_in": 50.0 }
                ] }
            ]
        }"#;
        let mut timeline = read_timeline(Cursor::new(document)).unwrap();
        let before = timeline.clone();

        let err = FlattenAction::default()
            .trigger(Some(&mut timeline), &NoProgress)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Core(seqflat_core::Error::ClipIdsExhausted { highest: ClipId(u64::MAX) })
        ));
        // Source tracks were hidden before the add failed and are enabled again
        assert_eq!(timeline, before);
    }

    #[test]
    fn test_register_in_both_menus() {
        let mut registry = ContextMenuRegistry::new();
        FlattenAction::default().register(&mut registry);

        for context in [MenuContext::Timeline, MenuContext::Spreadsheet] {
            assert_eq!(registry.entries_for(context), &[ACTION_TITLE.to_string()]);
        }
    }
}
