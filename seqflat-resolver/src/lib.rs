//! seqflat Resolver Library
//!
//! This library walks a timeline frame by frame and records which single clip
//! is visible at each frame, as run-length encoded occurrences per clip.

pub mod occurrence;
pub mod visibility;

pub use occurrence::{Occurrence, OccurrenceMap};
pub use visibility::{resolve_visibility, topmost_visible};

use seqflat_core::ClipId;

/// Result type for seqflat-resolver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for seqflat-resolver operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("seqflat core error: {0}")]
    Core(#[from] seqflat_core::Error),

    #[error("Clip {clip} belongs to unknown track {track}")]
    UnknownTrack { clip: ClipId, track: usize },
}
