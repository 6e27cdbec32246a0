//! seqflat Core Library
//!
//! This library provides the timeline data model, the host collaborator
//! interfaces that the visibility resolver and flattener are written against,
//! and the progress/cancellation plumbing shared by both passes.

pub mod clip;
#[cfg(feature = "serde")]
pub mod document;
pub mod host;
pub mod progress;
pub mod range;
pub mod timeline;

pub use clip::{ClipId, ClipInstance};
pub use host::{ClipView, EditTrack, TimelineEdit, TimelineQuery, TrackView};
pub use progress::{
    CancelFlag, NoProgress, Outcome, ProgressHost, ProgressTask, ProgressTracker, TrackerHost,
};
pub use range::{Frame, FrameRange, SourceTime};
pub use timeline::{Timeline, Track};

/// Result type for seqflat-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for seqflat-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid frame range: {first}..={last}")]
    InvalidRange { first: Frame, last: Frame },

    #[error("Cannot trim clip {clip} spanning {current} to {requested}")]
    TrimOutOfRange {
        clip: ClipId,
        current: FrameRange,
        requested: FrameRange,
    },

    #[error("Clip {clip} spans {range}, beyond timeline duration {duration}")]
    ClipOutOfBounds {
        clip: ClipId,
        range: FrameRange,
        duration: Frame,
    },

    #[error("Clips {first} and {second} overlap on track {track}")]
    OverlappingClips {
        track: usize,
        first: ClipId,
        second: ClipId,
    },

    #[error("Duplicate clip ID: {0}")]
    DuplicateClipId(ClipId),

    #[error("No clip IDs left above {highest}")]
    ClipIdsExhausted { highest: ClipId },

    #[error("Track not found: {0}")]
    TrackNotFound(usize),

    #[error("No clip in track slot {0}")]
    InvalidSlot(usize),
}
