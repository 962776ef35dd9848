//! Error types for the `framecut` crate.
//!
//! This module defines [`FramecutError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (virtual
//! file names, selection bounds, the engine's own message) to build a
//! user-facing status line without additional logging at the call site.

use std::io::Error as IoError;

use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `framecut` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramecutError {
    /// The engine has not been loaded yet.
    ///
    /// Call [`MediaEngine::load`](crate::MediaEngine::load) before issuing
    /// any other engine operation.
    #[error("Media engine is not loaded")]
    EngineNotReady,

    /// Staging, reading, or removing a virtual file failed.
    #[error("Engine I/O error on {name}: {reason}")]
    EngineIo {
        /// Virtual file name the operation targeted.
        name: String,
        /// Underlying reason reported by the engine.
        reason: String,
    },

    /// A command ran but failed, or produced no output.
    #[error("Engine command failed: {reason}")]
    EngineExec {
        /// Underlying reason reported by the engine.
        reason: String,
    },

    /// A selection violates `0 <= start <= end - MIN_GAP` or lies outside the media.
    #[error("Invalid selection: start ({start}) must be at least the minimum gap before end ({end})")]
    InvalidSelection {
        /// Selection start in seconds.
        start: f64,
        /// Selection end in seconds.
        end: f64,
    },

    /// A frame sequence was requested with fewer than two frames.
    #[error("Frame sequence needs at least 2 frames, got {0}")]
    InvalidFrameCount(usize),

    /// A timestamp is negative, not finite, or past the end of the media.
    #[error("Invalid timestamp: {0}s")]
    InvalidTimestamp(f64),

    /// The source name cannot be used as a virtual file name.
    #[error("Invalid source name: {0:?}")]
    InvalidSourceName(String),

    /// A frame extraction was requested before any timeline navigation.
    #[error("No time selected on the timeline")]
    MissingSelectedTime,

    /// Packaging frames into an archive failed.
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error occurred while reading or writing host files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}

impl From<ZipError> for FramecutError {
    fn from(error: ZipError) -> Self {
        FramecutError::ArchiveError(error.to_string())
    }
}

impl From<serde_json::Error> for FramecutError {
    fn from(error: serde_json::Error) -> Self {
        FramecutError::EngineExec {
            reason: format!("unreadable probe output: {error}"),
        }
    }
}

impl FramecutError {
    /// Shorthand for an [`EngineIo`](FramecutError::EngineIo) error.
    pub(crate) fn engine_io(name: &str, reason: impl ToString) -> Self {
        FramecutError::EngineIo {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for an [`EngineExec`](FramecutError::EngineExec) error.
    pub(crate) fn engine_exec(reason: impl ToString) -> Self {
        FramecutError::EngineExec {
            reason: reason.to_string(),
        }
    }
}
