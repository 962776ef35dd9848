//! Async job execution and status streaming.
//!
//! [`spawn_job`] runs a job on Tokio's blocking pool and returns a
//! [`JobFuture`]. Engine commands are blocking calls, so they never run on
//! the async workers. The engine sits behind a mutex, and a job holds the
//! lock from staging to cleanup, so jobs submitted concurrently run one
//! after another.
//!
//! [`WatchStatus`] is a [`StatusSink`] backed by a `tokio::sync::watch`
//! channel, for UIs that want to `await` status changes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//!
//! use tokio_stream::StreamExt;
//!
//! use framecut::{
//!     ExtractionJob, FramecutError, MediaEngine, MemoryEngine, PipelineOptions, SourceMedia,
//!     WatchStatus, spawn_job,
//! };
//!
//! # async fn example() -> Result<(), FramecutError> {
//! let mut engine = MemoryEngine::new().with_duration(10.0);
//! engine.load()?;
//! let source = SourceMedia::load(&mut engine, "input.mp4", vec![0; 16])?;
//! let engine = Arc::new(Mutex::new(engine));
//!
//! let status = WatchStatus::new();
//! let mut updates = status.stream();
//! let options = PipelineOptions::new().with_status(Arc::new(status.clone()));
//!
//! let job = ExtractionJob::CutClip { start: 1.0, end: 4.0 };
//! let artifact = spawn_job(engine, source, job, options).await?;
//! println!("{} ({} bytes)", artifact.file_name, artifact.len());
//!
//! if let Some(update) = updates.next().await {
//!     println!("{update}");
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::watch::{self, Receiver, Sender};
use tokio::task::{JoinError, JoinHandle};
use tokio_stream::wrappers::WatchStream;

use crate::config::PipelineOptions;
use crate::engine::MediaEngine;
use crate::error::FramecutError;
use crate::job::{Artifact, ExtractionJob};
use crate::pipeline::{DiscardSink, ExtractionPipeline};
use crate::source::SourceMedia;
use crate::status::{JobStatus, StatusSink};

/// A future that resolves to the artifact of a spawned job.
///
/// Dropping the future does not stop the job; use a
/// [`CancellationToken`](crate::CancellationToken) in the options for that.
pub struct JobFuture {
    handle: JoinHandle<Result<Artifact, FramecutError>>,
}

impl Future for JobFuture {
    type Output = Result<Artifact, FramecutError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|error| Err(join_failure(&error))))
    }
}

fn join_failure(error: &JoinError) -> FramecutError {
    if error.is_cancelled() {
        FramecutError::Cancelled
    } else {
        FramecutError::EngineExec {
            reason: format!("job panicked: {error}"),
        }
    }
}

/// Run `job` against `engine` on a blocking thread.
///
/// Unlike [`ExtractionPipeline::run`], the job publishes `Queued` and its
/// terminal status to the configured status sink. Must be called from within
/// a Tokio runtime.
pub fn spawn_job<E>(
    engine: Arc<Mutex<E>>,
    source: SourceMedia,
    job: ExtractionJob,
    options: PipelineOptions,
) -> JobFuture
where
    E: MediaEngine + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(move || {
        let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pipeline = ExtractionPipeline::new(&mut *engine, options);
        pipeline.run_reported(&source, &job, &mut DiscardSink)
    });
    JobFuture { handle }
}

/// A [`StatusSink`] that broadcasts through a `tokio::sync::watch` channel.
///
/// Clones share the channel. Receivers only ever see the latest status.
#[derive(Debug, Clone)]
pub struct WatchStatus {
    sender: Arc<Sender<JobStatus>>,
}

impl WatchStatus {
    /// Create a channel starting at [`JobStatus::Idle`].
    pub fn new() -> Self {
        let (sender, _) = watch::channel(JobStatus::Idle);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> Receiver<JobStatus> {
        self.sender.subscribe()
    }

    /// Status updates as a [`Stream`](tokio_stream::Stream), starting with
    /// the current value.
    pub fn stream(&self) -> WatchStream<JobStatus> {
        WatchStream::new(self.subscribe())
    }

    pub fn current(&self) -> JobStatus {
        self.sender.borrow().clone()
    }
}

impl Default for WatchStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for WatchStatus {
    fn publish(&self, status: &JobStatus) {
        self.sender.send_replace(status.clone());
    }
}
