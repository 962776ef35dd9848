//! # framecut
//!
//! Scrub a video timeline, select a range, and cut still frames, frame
//! sequences, and clips out of it by driving an FFmpeg-style engine.
//!
//! `framecut` is split into two halves that meet at [`ExtractionJob`]:
//!
//! - [`TimelineController`] is a pure state machine that turns pointer,
//!   keyboard, and player events into a playback position and an in/out
//!   [`Selection`], and snapshots them into jobs.
//! - [`ExtractionPipeline`] turns a job into an ordered sequence of
//!   [`MediaEngine`] operations (stage, execute, read, remove), including
//!   the end-of-stream frame policy and the zip path for frame sequences.
//!
//! ## Quick Start
//!
//! ### Cut a Clip
//!
//! ```no_run
//! use framecut::{
//!     DirectorySink, EngineOptions, ExtractionJob, ExtractionPipeline, FfmpegEngine,
//!     MediaEngine, PipelineOptions, SourceMedia,
//! };
//!
//! let mut engine = FfmpegEngine::new(EngineOptions::new());
//! engine.load()?;
//! let source = SourceMedia::from_path(&mut engine, "holiday.mp4")?;
//!
//! let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
//! let mut sink = DirectorySink::new("out");
//! let status = pipeline.submit(&source, &ExtractionJob::CutClip { start: 2.0, end: 5.0 }, &mut sink);
//! println!("{status}");
//! # Ok::<(), framecut::FramecutError>(())
//! ```
//!
//! ### Drive the Timeline
//!
//! ```
//! use framecut::{Marker, PlayerCommand, TimelineController, TimelineEvent};
//!
//! let mut timeline = TimelineController::new();
//! timeline.handle(TimelineEvent::MediaLoaded { duration: 10.0 });
//!
//! // Drag the start marker past the end: it stops half a second before it.
//! timeline.handle(TimelineEvent::MarkerPointerDown(Marker::Start));
//! timeline.handle(TimelineEvent::PointerMove { position: 1.0 });
//! timeline.handle(TimelineEvent::PointerUp);
//! assert_eq!(timeline.selection().start(), 9.5);
//!
//! let job = timeline.sequence_job(5);
//! println!("{job}");
//! ```
//!
//! ## Features
//!
//! - **Timeline state machine**: playback clamping, marker dragging with a
//!   minimum gap, frame and second stepping from the keyboard
//! - **Single frames**: WebP, PNG, or JPEG, with backward seeking for frames
//!   at the very end of the stream
//! - **Frame sequences**: evenly spaced frames packed into one zip archive
//! - **Clips**: re-encoded cuts, optionally reversed
//! - **Guaranteed cleanup**: every virtual file a job creates is removed on
//!   every exit path
//! - **Status & progress**: [`JobStatus`] sinks, [`ProgressCallback`], and
//!   [`CancellationToken`]
//! - **Probing & validation**: [`ProbeResult`] with table flattening and
//!   [`validate_job`]
//! - **Dry runs**: [`MemoryEngine`] records argv instead of running it
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`spawn_job`] and [`WatchStatus`] via Tokio |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! [`FfmpegEngine`] needs `ffmpeg` and `ffprobe` binaries, found on `PATH`
//! or through the `FRAMECUT_FFMPEG` and `FRAMECUT_FFPROBE` environment
//! variables.

pub mod archive;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffmpeg;
pub mod job;
pub mod memory;
pub mod metadata;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod selection;
pub mod sink;
pub mod source;
pub mod status;
#[cfg(feature = "async")]
pub mod stream;
pub mod timeline;
pub mod utilities;
pub mod validation;
mod workspace;

pub use archive::ArchiveBuilder;
pub use command::FrameStrategy;
pub use config::PipelineOptions;
pub use engine::MediaEngine;
pub use error::FramecutError;
pub use ffmpeg::{EngineOptions, FfmpegEngine, FfmpegLogLevel};
pub use job::{Artifact, ArtifactKind, ExtractionJob, FrameFormat};
pub use memory::MemoryEngine;
pub use metadata::{FormatInfo, ProbeResult, StreamInfo, StreamKind};
pub use pipeline::ExtractionPipeline;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use selection::{MIN_GAP, Marker, Selection};
pub use sink::{ArtifactSink, DirectorySink, MemorySink};
pub use source::SourceMedia;
pub use status::{JobStatus, LogStatus, StatusCell, StatusSink};
#[cfg(feature = "async")]
pub use stream::{JobFuture, WatchStatus, spawn_job};
pub use timeline::{InteractionState, Key, PlayerCommand, TimelineController, TimelineEvent};
pub use utilities::format_clock;
pub use validation::{ValidationReport, validate_job, validate_source};
