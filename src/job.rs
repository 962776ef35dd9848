//! Extraction jobs and the artifacts they produce.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::progress::OperationType;
use crate::utilities::{artifact_stem, index_width, timestamp_label};

/// One unit of work for the [`ExtractionPipeline`](crate::ExtractionPipeline).
///
/// Jobs are plain values. Building one copies the timestamps it needs, so a
/// job is unaffected by selection changes made after it was created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractionJob {
    /// A single still frame at `timestamp` seconds.
    ExtractFrame { timestamp: f64 },
    /// The `[start, end]` range re-encoded as a clip.
    CutClip { start: f64, end: f64 },
    /// The `[start, end]` range re-encoded and played backwards.
    CutClipReversed { start: f64, end: f64 },
    /// `count` evenly spaced frames from `start` to `end` inclusive, packed
    /// into one archive.
    ExtractFrameSequence { start: f64, end: f64, count: usize },
}

impl ExtractionJob {
    /// The progress category of this job.
    pub fn operation(&self) -> OperationType {
        match self {
            ExtractionJob::ExtractFrame { .. } => OperationType::FrameExtraction,
            ExtractionJob::CutClip { .. } => OperationType::ClipCut,
            ExtractionJob::CutClipReversed { .. } => OperationType::ReversedClipCut,
            ExtractionJob::ExtractFrameSequence { .. } => OperationType::FrameSequence,
        }
    }

    /// Status line shown while the job runs.
    pub(crate) fn running_message(&self) -> String {
        match self {
            ExtractionJob::ExtractFrame { timestamp } => {
                format!("Extracting frame at {}s...", timestamp_label(*timestamp))
            }
            ExtractionJob::CutClip { .. } => "Cutting video...".to_string(),
            ExtractionJob::CutClipReversed { .. } => "Cutting and reversing video...".to_string(),
            ExtractionJob::ExtractFrameSequence { .. } => {
                "Extracting multiple frames...".to_string()
            }
        }
    }

    /// Status line shown once the artifact has been delivered.
    pub(crate) fn done_message(&self) -> String {
        match self {
            ExtractionJob::ExtractFrame { timestamp } => {
                format!("Extracted frame at {}s", timestamp_label(*timestamp))
            }
            ExtractionJob::CutClip { .. } => "Video cut complete!".to_string(),
            ExtractionJob::CutClipReversed { .. } => "Video cut and reversed complete!".to_string(),
            ExtractionJob::ExtractFrameSequence { .. } => {
                "Frames extracted and downloaded!".to_string()
            }
        }
    }

    /// Prefix of the status line shown when the job fails.
    pub(crate) fn failure_prefix(&self) -> &'static str {
        match self {
            ExtractionJob::ExtractFrame { .. } => "Error extracting frame",
            ExtractionJob::CutClip { .. } => "Error cutting video",
            ExtractionJob::CutClipReversed { .. } => "Error cutting and reversing video",
            ExtractionJob::ExtractFrameSequence { .. } => "Error extracting frames",
        }
    }
}

impl Display for ExtractionJob {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExtractionJob::ExtractFrame { timestamp } => {
                write!(f, "frame at {}s", timestamp_label(*timestamp))
            }
            ExtractionJob::CutClip { start, end } => write!(
                f,
                "cut {}s-{}s",
                timestamp_label(*start),
                timestamp_label(*end)
            ),
            ExtractionJob::CutClipReversed { start, end } => write!(
                f,
                "reversed cut {}s-{}s",
                timestamp_label(*start),
                timestamp_label(*end)
            ),
            ExtractionJob::ExtractFrameSequence { start, end, count } => write!(
                f,
                "{count} frames {}s-{}s",
                timestamp_label(*start),
                timestamp_label(*end)
            ),
        }
    }
}

/// Still image encoding for extracted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFormat {
    /// WebP. This is the default.
    #[default]
    Webp,
    Png,
    Jpeg,
}

impl FrameFormat {
    /// File extension, which also selects the engine's encoder.
    pub fn extension(self) -> &'static str {
        match self {
            FrameFormat::Webp => "webp",
            FrameFormat::Png => "png",
            FrameFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FrameFormat::Webp => "image/webp",
            FrameFormat::Png => "image/png",
            FrameFormat::Jpeg => "image/jpeg",
        }
    }

    /// Parse an extension or format name (`webp`, `png`, `jpg`, `jpeg`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "webp" => Some(FrameFormat::Webp),
            "png" => Some(FrameFormat::Png),
            "jpg" | "jpeg" => Some(FrameFormat::Jpeg),
            _ => None,
        }
    }
}

/// What kind of file an [`Artifact`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A single still frame.
    StillImage(FrameFormat),
    /// An MP4 clip.
    VideoClip,
    /// A zip archive of still frames.
    FrameArchive,
}

impl ArtifactKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            ArtifactKind::StillImage(format) => format.mime_type(),
            ArtifactKind::VideoClip => "video/mp4",
            ArtifactKind::FrameArchive => "application/zip",
        }
    }
}

/// A finished, named file ready to hand to an
/// [`ArtifactSink`](crate::ArtifactSink).
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Artifact {
    /// Suggested file name for the download.
    pub file_name: String,
    /// What the bytes are.
    pub kind: ArtifactKind,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Download name of a single frame: `frame_9.95.webp`.
pub(crate) fn frame_file_name(timestamp: f64, format: FrameFormat) -> String {
    format!("frame_{}.{}", timestamp_label(timestamp), format.extension())
}

/// Archive entry of frame `index` in a `count`-frame sequence:
/// `frame_007_3.50.webp`.
pub(crate) fn sequence_entry_name(
    index: usize,
    count: usize,
    timestamp: f64,
    format: FrameFormat,
) -> String {
    format!(
        "frame_{index:0width$}_{}.{}",
        timestamp_label(timestamp),
        format.extension(),
        width = index_width(count)
    )
}

/// Download name of a derived file: `holiday_cut.mp4`, `holiday_frames.zip`.
pub(crate) fn derived_file_name(source_name: &str, suffix: &str, extension: &str) -> String {
    format!("{}_{suffix}.{extension}", artifact_stem(source_name))
}
