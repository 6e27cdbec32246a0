//! seqflat Flatten Library
//!
//! This library turns the occurrences found by the visibility resolver into a
//! single track whose clips reproduce exactly what the stacked timeline shows.

pub mod action;
pub mod flattener;
pub mod menu;

pub use action::{ActionOutcome, FlattenAction};
pub use flattener::{flatten_timeline, Flattener};
pub use menu::{ContextMenuRegistry, MenuContext};

use seqflat_core::{ClipId, Frame, FrameRange, SourceTime};

/// Title of the progress task covering the visibility scan
pub const ANALYSIS_TITLE: &str = "Analysing Sequence...";

/// Title of the progress task covering track assembly
pub const ASSEMBLY_TITLE: &str = "Flattening Sequence...";

/// Name given to the flattened track unless configured otherwise
pub const DEFAULT_TRACK_NAME: &str = "Flattened";

/// Result type for seqflat-flatten operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for seqflat-flatten operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("seqflat core error: {0}")]
    Core(#[from] seqflat_core::Error),

    #[error("Visibility resolution failed: {0}")]
    Resolver(#[from] seqflat_resolver::Error),

    #[error("Clip not found: {0}")]
    UnknownClip(ClipId),

    #[error("Clip {clip} was trimmed to {actual}, expected {expected}")]
    TrimMismatch {
        clip: ClipId,
        expected: FrameRange,
        actual: FrameRange,
    },

    #[error("Clip {clip} maps frame {frame} to source {actual}, expected {expected}")]
    MappingDrift {
        clip: ClipId,
        frame: Frame,
        expected: SourceTime,
        actual: SourceTime,
    },
}

/// Flatten configuration
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Name of the track holding the flattened clips
    pub track_name: String,
    /// Disable the original tracks once the flattened track is added
    pub hide_source_tracks: bool,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            track_name: DEFAULT_TRACK_NAME.to_string(),
            hide_source_tracks: true,
        }
    }
}
