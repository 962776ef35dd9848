//! Pipeline configuration.
//!
//! [`PipelineOptions`] is a builder that threads the status sink, progress
//! callback, cancellation token, and output settings through the
//! [`ExtractionPipeline`](crate::ExtractionPipeline) without widening every
//! method signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use framecut::{
//!     CancellationToken, FrameFormat, PipelineOptions, ProgressCallback, ProgressInfo,
//!     StatusCell,
//! };
//!
//! struct FrameCounter;
//!
//! impl ProgressCallback for FrameCounter {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         eprint!("\rframe {}/{}", info.current, info.total.unwrap_or(0));
//!     }
//! }
//!
//! let status = StatusCell::new();
//! let stop = CancellationToken::new();
//! let options = PipelineOptions::new()
//!     .with_status(Arc::new(status.clone()))
//!     .with_progress(Arc::new(FrameCounter))
//!     .with_cancellation(stop.clone())
//!     .with_frame_format(FrameFormat::Png)
//!     .with_batch_size(5);
//! assert_eq!(options.frame_format(), FrameFormat::Png);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::job::FrameFormat;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::status::{NoOpStatus, StatusSink};

/// Default `-q:v` value for still frames.
pub const DEFAULT_FRAME_QUALITY: u8 = 2;

/// Default encoder for cut clips.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// Default encoder preset for cut clips.
pub const DEFAULT_PRESET: &str = "fast";

/// Configuration for an [`ExtractionPipeline`](crate::ExtractionPipeline).
///
/// A default-constructed value publishes nowhere, never cancels, writes WebP
/// frames at quality 2, encodes clips with `libx264`/`fast`, and discards
/// partial sequence results.
#[derive(Clone)]
pub struct PipelineOptions {
    pub(crate) status: Arc<dyn StatusSink>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// Fire the progress callback every N frames.
    pub(crate) batch_size: u64,
    pub(crate) frame_format: FrameFormat,
    pub(crate) quality: u8,
    pub(crate) video_codec: String,
    pub(crate) preset: String,
    pub(crate) keep_partial: bool,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("frame_format", &self.frame_format)
            .field("quality", &self.quality)
            .field("video_codec", &self.video_codec)
            .field("preset", &self.preset)
            .field("keep_partial", &self.keep_partial)
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            status: Arc::new(NoOpStatus),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            frame_format: FrameFormat::default(),
            quality: DEFAULT_FRAME_QUALITY,
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            keep_partial: false,
        }
    }

    /// Publish job status to `sink`.
    #[must_use]
    pub fn with_status(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.status = sink;
        self
    }

    /// Attach a progress callback for frame sequences.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Stop the job when `token` is cancelled.
    ///
    /// When the token is cancelled the job stops at the next checkpoint and
    /// fails with [`FramecutError::Cancelled`](crate::FramecutError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_frame_format(mut self, format: FrameFormat) -> Self {
        self.frame_format = format;
        self
    }

    /// Set the `-q:v` value used for still frames (lower is better).
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    #[must_use]
    pub fn with_video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = codec.into();
        self
    }

    #[must_use]
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Deliver the frames collected before a failed or cancelled sequence as
    /// a `_frames_partial.zip` archive. The job still reports failure.
    #[must_use]
    pub fn with_keep_partial(mut self, keep: bool) -> Self {
        self.keep_partial = keep;
        self
    }

    pub fn frame_format(&self) -> FrameFormat {
        self.frame_format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn video_codec(&self) -> &str {
        &self.video_codec
    }

    pub fn preset(&self) -> &str {
        &self.preset
    }

    pub fn keep_partial(&self) -> bool {
        self.keep_partial
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}
