//! Engine command construction.
//!
//! Every argv the pipeline sends to the engine is built here, so the exact
//! shape of each command is defined in one place. The only policy decision
//! is [`FrameStrategy::select`]: exact forward seeking becomes unreliable in
//! the last fraction of a second of many containers, so frames close to the
//! end of the stream are taken by seeking backwards from the end instead.

use crate::utilities::format_seconds;

/// Frames closer than this many seconds to the end use [`FrameStrategy::FromEnd`].
pub const NEAR_EOF_THRESHOLD: f64 = 0.2;

/// How far before the end of the stream a from-end extraction seeks.
pub const EOF_SEEK_OFFSET: &str = "-0.1";

/// Engine file written by a single-frame extraction, before its extension.
pub const FRAME_OUTPUT_STEM: &str = "extracted_frame";

/// Engine file written by the cut pass.
pub const CUT_OUTPUT: &str = "cut_video.mp4";

/// Engine file written by the reverse pass.
pub const REVERSED_OUTPUT: &str = "cut_reversed_video.mp4";

/// How a single frame is located in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStrategy {
    /// Seek forward to the timestamp and take exactly one frame.
    FromStart,
    /// Seek to [`EOF_SEEK_OFFSET`] before the end and take the next frame.
    FromEnd,
}

impl FrameStrategy {
    /// Pick the strategy for a frame at `timestamp`.
    ///
    /// `FromEnd` iff the duration is known and
    /// `|timestamp - duration| < NEAR_EOF_THRESHOLD`.
    ///
    /// ```
    /// use framecut::FrameStrategy;
    ///
    /// assert_eq!(FrameStrategy::select(9.95, Some(10.0)), FrameStrategy::FromEnd);
    /// assert_eq!(FrameStrategy::select(5.0, Some(10.0)), FrameStrategy::FromStart);
    /// assert_eq!(FrameStrategy::select(9.95, None), FrameStrategy::FromStart);
    /// ```
    pub fn select(timestamp: f64, duration: Option<f64>) -> Self {
        match duration {
            Some(duration) if (timestamp - duration).abs() < NEAR_EOF_THRESHOLD => {
                FrameStrategy::FromEnd
            }
            _ => FrameStrategy::FromStart,
        }
    }

    /// Pick the strategy for frame `index` of a `count`-frame sequence.
    ///
    /// Same as [`select`](FrameStrategy::select), except that the last frame
    /// is always treated as a boundary frame when the duration is known.
    pub fn select_in_sequence(
        timestamp: f64,
        duration: Option<f64>,
        index: usize,
        count: usize,
    ) -> Self {
        let known = duration.filter(|duration| *duration > 0.0);
        if known.is_some() && index + 1 == count {
            FrameStrategy::FromEnd
        } else {
            Self::select(timestamp, known)
        }
    }
}

fn argv<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

/// Extract one frame of `input` into `output`.
pub fn frame_command(
    strategy: FrameStrategy,
    timestamp: f64,
    input: &str,
    quality: u8,
    output: &str,
) -> Vec<String> {
    let quality = quality.to_string();
    let seek = format_seconds(timestamp);
    match strategy {
        FrameStrategy::FromStart => argv([
            "-ss",
            seek.as_str(),
            "-i",
            input,
            "-frames:v",
            "1",
            "-q:v",
            quality.as_str(),
            output,
        ]),
        FrameStrategy::FromEnd => argv([
            "-sseof",
            EOF_SEEK_OFFSET,
            "-i",
            input,
            "-update",
            "1",
            "-vframes",
            "1",
            "-q:v",
            quality.as_str(),
            output,
        ]),
    }
}

/// Re-encode `[start, end]` of `input` into `output`.
///
/// The video is always re-encoded rather than stream-copied, so the cut
/// lands where requested instead of on the nearest keyframe.
pub fn cut_command(
    input: &str,
    start: f64,
    end: f64,
    codec: &str,
    preset: &str,
    output: &str,
) -> Vec<String> {
    let seek = format_seconds(start);
    let length = format_seconds(end - start);
    argv([
        "-i",
        input,
        "-ss",
        seek.as_str(),
        "-t",
        length.as_str(),
        "-c:v",
        codec,
        "-preset",
        preset,
        output,
    ])
}

/// Reverse the frame order of `input` into `output`.
pub fn reverse_command(input: &str, output: &str) -> Vec<String> {
    argv(["-i", input, "-vf", "reverse", output])
}
