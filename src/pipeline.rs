//! Job execution.
//!
//! [`ExtractionPipeline`] turns one [`ExtractionJob`] into an ordered
//! sequence of engine operations: stage the source, run the commands, read
//! the produced files back, and remove every virtual file the job created.
//! Removal is tied to a scope guard, so it happens on success, on failure,
//! and on cancellation alike.
//!
//! # Example
//!
//! ```
//! use framecut::{ExtractionJob, ExtractionPipeline, MediaEngine, MemoryEngine, PipelineOptions, SourceMedia};
//!
//! let mut engine = MemoryEngine::new().with_duration(10.0);
//! engine.load()?;
//! let source = SourceMedia::load(&mut engine, "holiday.mp4", vec![0; 16])?;
//!
//! let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
//! let artifact = pipeline.run(&source, &ExtractionJob::CutClip { start: 2.0, end: 5.0 })?;
//! assert_eq!(artifact.file_name, "holiday_cut.mp4");
//! assert!(engine.files().is_empty());
//! # Ok::<(), framecut::FramecutError>(())
//! ```

use log::{debug, warn};

use crate::archive::ArchiveBuilder;
use crate::command::{
    CUT_OUTPUT, FRAME_OUTPUT_STEM, FrameStrategy, REVERSED_OUTPUT, cut_command, frame_command,
    reverse_command,
};
use crate::config::PipelineOptions;
use crate::engine::MediaEngine;
use crate::error::FramecutError;
use crate::job::{
    Artifact, ArtifactKind, ExtractionJob, derived_file_name, frame_file_name,
    sequence_entry_name,
};
use crate::progress::{OperationType, ProgressTracker};
use crate::selection::DURATION_EPSILON;
use crate::sink::ArtifactSink;
use crate::source::SourceMedia;
use crate::status::JobStatus;
use crate::workspace::Workspace;

/// Prefix given to the staged source when its name collides with a file the
/// job writes.
const COLLISION_PREFIX: &str = "source_";

/// Runs extraction jobs against a borrowed engine.
///
/// The pipeline holds the engine mutably for its whole lifetime, so at most
/// one engine command is ever in flight.
pub struct ExtractionPipeline<'e, E: MediaEngine + ?Sized> {
    engine: &'e mut E,
    options: PipelineOptions,
}

/// Sink for callers that take the artifact from the return value.
pub(crate) struct DiscardSink;

impl ArtifactSink for DiscardSink {
    fn deliver(&mut self, _artifact: &Artifact) -> Result<(), FramecutError> {
        Ok(())
    }
}

impl<'e, E: MediaEngine + ?Sized> ExtractionPipeline<'e, E> {
    pub fn new(engine: &'e mut E, options: PipelineOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// The engine, for inspection between jobs.
    pub fn engine(&mut self) -> &mut E {
        &mut *self.engine
    }

    /// Run `job` and return its artifact.
    ///
    /// `Running` and per-frame `Progress` updates are published to the
    /// status sink; terminal states are left to the caller. Partial sequence
    /// results are never returned from here; use
    /// [`submit`](ExtractionPipeline::submit) with
    /// [`with_keep_partial`](PipelineOptions::with_keep_partial) for those.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before any engine call. Engine errors
    /// abort the remaining steps. Either way every virtual file the job
    /// created has been removed when this returns.
    pub fn run(
        &mut self,
        source: &SourceMedia,
        job: &ExtractionJob,
    ) -> Result<Artifact, FramecutError> {
        self.perform(source, job, &mut DiscardSink)
    }

    /// Run `job`, hand the artifact to `sink`, and report the final status.
    ///
    /// Never fails: errors become [`JobStatus::Failed`] (or
    /// [`JobStatus::Cancelled`]) carrying the underlying message, and every
    /// status is also published to the configured status sink. The staged
    /// source is removed only after `sink` has received the artifact.
    pub fn submit(
        &mut self,
        source: &SourceMedia,
        job: &ExtractionJob,
        sink: &mut dyn ArtifactSink,
    ) -> JobStatus {
        let result = self.run_reported(source, job, sink);
        final_status(job, &result)
    }

    /// [`run`](ExtractionPipeline::run) bracketed by `Queued` and a terminal
    /// status.
    pub(crate) fn run_reported(
        &mut self,
        source: &SourceMedia,
        job: &ExtractionJob,
        sink: &mut dyn ArtifactSink,
    ) -> Result<Artifact, FramecutError> {
        self.publish(JobStatus::Queued {
            message: format!("Queued {job}"),
        });
        let result = self.perform(source, job, sink);
        self.publish(final_status(job, &result));
        result
    }

    fn publish(&self, status: JobStatus) {
        self.options.status.publish(&status);
    }

    fn perform(
        &mut self,
        source: &SourceMedia,
        job: &ExtractionJob,
        sink: &mut dyn ArtifactSink,
    ) -> Result<Artifact, FramecutError> {
        if !self.engine.is_loaded() {
            return Err(FramecutError::EngineNotReady);
        }
        validate_request(job, source.duration())?;

        let options = &self.options;
        let outputs = job_outputs(job, options);
        let staged = staging_name(source.name(), &outputs);
        debug!("Starting {job} on {staged}");
        options.status.publish(&JobStatus::Running {
            message: job.running_message(),
        });

        let mut workspace = Workspace::new(&mut *self.engine);
        workspace.stage(&staged, source.bytes())?;

        let artifact = match *job {
            ExtractionJob::ExtractFrame { timestamp } => {
                extract_frame(&mut workspace, options, &staged, timestamp, source.duration())?
            }
            ExtractionJob::CutClip { start, end } => {
                cut_clip(&mut workspace, options, source.name(), &staged, start, end)?
            }
            ExtractionJob::CutClipReversed { start, end } => {
                cut_clip_reversed(&mut workspace, options, source.name(), &staged, start, end)?
            }
            ExtractionJob::ExtractFrameSequence { start, end, count } => extract_sequence(
                &mut workspace,
                options,
                source,
                &staged,
                (start, end, count),
                &outputs,
                sink,
            )?,
        };

        sink.deliver(&artifact)?;
        debug!("Finished {job}: {} ({} bytes)", artifact.file_name, artifact.len());
        Ok(artifact)
    }
}

fn final_status(job: &ExtractionJob, result: &Result<Artifact, FramecutError>) -> JobStatus {
    match result {
        Ok(_) => JobStatus::Done {
            message: job.done_message(),
        },
        Err(FramecutError::Cancelled) => JobStatus::Cancelled {
            message: format!("Cancelled {job}"),
        },
        Err(error) => JobStatus::Failed {
            message: format!("{}: {error}", job.failure_prefix()),
        },
    }
}

/// Reject jobs that could not have come from a clamped selection.
fn validate_request(job: &ExtractionJob, duration: Option<f64>) -> Result<(), FramecutError> {
    let within_media = |time: f64| duration.is_none_or(|d| time <= d + DURATION_EPSILON);
    let check_range = |start: f64, end: f64| {
        let valid = start.is_finite()
            && end.is_finite()
            && start >= 0.0
            && start < end
            && within_media(end);
        if valid {
            Ok(())
        } else {
            Err(FramecutError::InvalidSelection { start, end })
        }
    };

    match *job {
        ExtractionJob::ExtractFrame { timestamp } => {
            if timestamp.is_finite() && timestamp >= 0.0 && within_media(timestamp) {
                Ok(())
            } else {
                Err(FramecutError::InvalidTimestamp(timestamp))
            }
        }
        ExtractionJob::CutClip { start, end } | ExtractionJob::CutClipReversed { start, end } => {
            check_range(start, end)
        }
        ExtractionJob::ExtractFrameSequence { start, end, count } => {
            if count < 2 {
                return Err(FramecutError::InvalidFrameCount(count));
            }
            check_range(start, end)
        }
    }
}

/// Every virtual file name `job` writes, in the order it writes them.
fn job_outputs(job: &ExtractionJob, options: &PipelineOptions) -> Vec<String> {
    let format = options.frame_format;
    match *job {
        ExtractionJob::ExtractFrame { .. } => {
            vec![format!("{FRAME_OUTPUT_STEM}.{}", format.extension())]
        }
        ExtractionJob::CutClip { .. } => vec![CUT_OUTPUT.to_string()],
        ExtractionJob::CutClipReversed { .. } => {
            vec![CUT_OUTPUT.to_string(), REVERSED_OUTPUT.to_string()]
        }
        ExtractionJob::ExtractFrameSequence { start, end, count } => {
            let step = sequence_step(start, end, count);
            (0..count)
                .map(|index| {
                    sequence_entry_name(index, count, start + index as f64 * step, format)
                })
                .collect()
        }
    }
}

fn staging_name(source_name: &str, outputs: &[String]) -> String {
    if outputs.iter().any(|output| output == source_name) {
        format!("{COLLISION_PREFIX}{source_name}")
    } else {
        source_name.to_string()
    }
}

fn sequence_step(start: f64, end: f64, count: usize) -> f64 {
    if count < 2 {
        0.0
    } else {
        (end - start) / (count - 1) as f64
    }
}

fn check_cancelled(options: &PipelineOptions) -> Result<(), FramecutError> {
    if options.is_cancelled() {
        Err(FramecutError::Cancelled)
    } else {
        Ok(())
    }
}

fn extract_frame<E: MediaEngine + ?Sized>(
    workspace: &mut Workspace<'_, E>,
    options: &PipelineOptions,
    input: &str,
    timestamp: f64,
    duration: Option<f64>,
) -> Result<Artifact, FramecutError> {
    let format = options.frame_format;
    let output = format!("{FRAME_OUTPUT_STEM}.{}", format.extension());
    let strategy = FrameStrategy::select(timestamp, duration);
    debug!("Frame at {timestamp}s uses {strategy:?}");

    workspace.execute(&frame_command(
        strategy,
        timestamp,
        input,
        options.quality,
        &output,
    ))?;
    let bytes = workspace.read(&output)?;
    workspace.release(&output);

    Ok(Artifact {
        file_name: frame_file_name(timestamp, format),
        kind: ArtifactKind::StillImage(format),
        bytes,
    })
}

fn cut_clip<E: MediaEngine + ?Sized>(
    workspace: &mut Workspace<'_, E>,
    options: &PipelineOptions,
    source_name: &str,
    input: &str,
    start: f64,
    end: f64,
) -> Result<Artifact, FramecutError> {
    workspace.execute(&cut_command(
        input,
        start,
        end,
        &options.video_codec,
        &options.preset,
        CUT_OUTPUT,
    ))?;
    let bytes = workspace.read(CUT_OUTPUT)?;
    workspace.release(CUT_OUTPUT);

    Ok(Artifact {
        file_name: derived_file_name(source_name, "cut", "mp4"),
        kind: ArtifactKind::VideoClip,
        bytes,
    })
}

fn cut_clip_reversed<E: MediaEngine + ?Sized>(
    workspace: &mut Workspace<'_, E>,
    options: &PipelineOptions,
    source_name: &str,
    input: &str,
    start: f64,
    end: f64,
) -> Result<Artifact, FramecutError> {
    workspace.execute(&cut_command(
        input,
        start,
        end,
        &options.video_codec,
        &options.preset,
        CUT_OUTPUT,
    ))?;
    check_cancelled(options)?;
    workspace.execute(&reverse_command(CUT_OUTPUT, REVERSED_OUTPUT))?;
    let bytes = workspace.read(REVERSED_OUTPUT)?;
    workspace.release(REVERSED_OUTPUT);
    workspace.release(CUT_OUTPUT);

    Ok(Artifact {
        file_name: derived_file_name(source_name, "cut_reversed", "mp4"),
        kind: ArtifactKind::VideoClip,
        bytes,
    })
}

fn extract_sequence<E: MediaEngine + ?Sized>(
    workspace: &mut Workspace<'_, E>,
    options: &PipelineOptions,
    source: &SourceMedia,
    input: &str,
    (start, end, count): (f64, f64, usize),
    entries: &[String],
    sink: &mut dyn ArtifactSink,
) -> Result<Artifact, FramecutError> {
    let step = sequence_step(start, end, count);
    let duration = source.duration();
    let mut archive = ArchiveBuilder::new();
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::FrameSequence,
        Some(count as u64),
        options.batch_size,
    );

    for (index, entry) in entries.iter().enumerate() {
        let timestamp = start + index as f64 * step;
        let outcome = check_cancelled(options).and_then(|()| {
            let strategy = FrameStrategy::select_in_sequence(timestamp, duration, index, count);
            workspace.execute(&frame_command(
                strategy,
                timestamp,
                input,
                options.quality,
                entry,
            ))?;
            let bytes = workspace.read(entry)?;
            workspace.release(entry);
            archive.add(entry.as_str(), bytes)
        });

        if let Err(error) = outcome {
            if options.keep_partial && !archive.is_empty() {
                deliver_partial(archive, source.name(), sink);
            }
            return Err(error);
        }

        tracker.advance(Some(index as u64), Some(timestamp));
        options.status.publish(&JobStatus::Progress {
            current: index + 1,
            total: count,
            message: format!("Extracted frame {}/{count}", index + 1),
        });
    }
    tracker.finish();

    Ok(Artifact {
        file_name: derived_file_name(source.name(), "frames", "zip"),
        kind: ArtifactKind::FrameArchive,
        bytes: archive.finish()?,
    })
}

/// Best effort: a failure here must not mask the error that ended the job.
fn deliver_partial(archive: ArchiveBuilder, source_name: &str, sink: &mut dyn ArtifactSink) {
    let frames = archive.len();
    let delivered = archive.finish().and_then(|bytes| {
        sink.deliver(&Artifact {
            file_name: derived_file_name(source_name, "frames_partial", "zip"),
            kind: ArtifactKind::FrameArchive,
            bytes,
        })
    });
    match delivered {
        Ok(()) => warn!("Delivered partial archive with {frames} frames"),
        Err(error) => warn!("Could not deliver partial archive: {error}"),
    }
}
