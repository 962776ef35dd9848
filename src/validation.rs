//! Pre-flight checks.
//!
//! [`validate_job`] inspects a job against the probed source and returns a
//! [`ValidationReport`] describing anything that will fail or degrade the
//! result, without touching the engine.
//!
//! # Example
//!
//! ```
//! use framecut::{ExtractionJob, MediaEngine, MemoryEngine, SourceMedia, validate_job};
//!
//! let mut engine = MemoryEngine::new().with_duration(10.0);
//! engine.load()?;
//! let source = SourceMedia::load(&mut engine, "input.mp4", vec![0; 16])?;
//!
//! let report = validate_job(&ExtractionJob::ExtractFrame { timestamp: 12.0 }, source.probe());
//! assert!(!report.is_valid());
//! for error in &report.errors {
//!     println!("Error: {error}");
//! }
//! # Ok::<(), framecut::FramecutError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::job::ExtractionJob;
use crate::metadata::ProbeResult;
use crate::selection::DURATION_EPSILON;

/// Reversed clips longer than this are flagged: the reverse filter buffers
/// every decoded frame.
pub const REVERSE_WARNING_SECONDS: f64 = 30.0;

/// Summary of validation findings.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that may affect the result.
    pub warnings: Vec<String>,
    /// Fatal issues that will prevent the job from running.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of findings (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check the source on its own.
pub fn validate_source(probe: &ProbeResult) -> ValidationReport {
    let mut report = ValidationReport::default();

    // ── Streams ────────────────────────────────────────────────────
    match probe.video() {
        None => report.errors.push("No video stream found".to_string()),
        Some(video) => {
            if matches!(video.width, Some(0)) || matches!(video.height, Some(0)) {
                report.errors.push(format!(
                    "Invalid video dimensions: {}×{}",
                    video.width.unwrap_or(0),
                    video.height.unwrap_or(0),
                ));
            }
            report.info.push(format!(
                "Video: {} {}×{} @ {} fps",
                video.codec.as_deref().unwrap_or("unknown codec"),
                video.width.map_or("?".to_string(), |w| w.to_string()),
                video.height.map_or("?".to_string(), |h| h.to_string()),
                video
                    .frames_per_second
                    .map_or("?".to_string(), |fps| format!("{fps:.2}")),
            ));
        }
    }

    // ── Duration ───────────────────────────────────────────────────
    match probe.duration() {
        Some(duration) => report.info.push(format!("Duration: {duration:.2}s")),
        None => report.warnings.push(
            "Duration unknown: frames near the end will be seeked forward".to_string(),
        ),
    }

    report
}

/// Check `job` against the probed source.
///
/// Includes everything [`validate_source`] reports.
pub fn validate_job(job: &ExtractionJob, probe: &ProbeResult) -> ValidationReport {
    let mut report = validate_source(probe);
    let duration = probe.duration();
    let frame_length = probe
        .video()
        .and_then(|video| video.frames_per_second)
        .filter(|fps| *fps > 0.0)
        .map(|fps| 1.0 / fps);

    match *job {
        ExtractionJob::ExtractFrame { timestamp } => {
            check_time(&mut report, "Timestamp", timestamp, duration);
        }
        ExtractionJob::CutClip { start, end } => {
            check_range(&mut report, start, end, duration, frame_length);
        }
        ExtractionJob::CutClipReversed { start, end } => {
            check_range(&mut report, start, end, duration, frame_length);
            if end - start > REVERSE_WARNING_SECONDS {
                report.warnings.push(format!(
                    "Reversing {:.1}s of video holds every frame in memory",
                    end - start
                ));
            }
        }
        ExtractionJob::ExtractFrameSequence { start, end, count } => {
            if count < 2 {
                report
                    .errors
                    .push(format!("Frame sequence needs at least 2 frames, got {count}"));
            } else {
                check_range(&mut report, start, end, duration, frame_length);
                let step = (end - start) / (count - 1) as f64;
                if frame_length.is_some_and(|length| step > 0.0 && step < length) {
                    report.warnings.push(format!(
                        "Frames are {step:.3}s apart, closer than one source frame; expect duplicates"
                    ));
                }
            }
        }
    }

    report
}

fn check_time(report: &mut ValidationReport, label: &str, time: f64, duration: Option<f64>) {
    if !time.is_finite() || time < 0.0 {
        report.errors.push(format!("{label} {time}s is not a valid time"));
    } else if duration.is_some_and(|duration| time > duration + DURATION_EPSILON) {
        report.errors.push(format!(
            "{label} {time:.2}s is beyond the end of the media ({:.2}s)",
            duration.unwrap_or_default()
        ));
    }
}

fn check_range(
    report: &mut ValidationReport,
    start: f64,
    end: f64,
    duration: Option<f64>,
    frame_length: Option<f64>,
) {
    check_time(report, "Start", start, duration);
    check_time(report, "End", end, duration);
    if start >= end {
        report
            .errors
            .push(format!("Start {start:.2}s must be before end {end:.2}s"));
    } else if frame_length.is_some_and(|length| end - start < length) {
        report.warnings.push(format!(
            "Selection of {:.3}s is shorter than one frame",
            end - start
        ));
    }
}
