//! Frame-by-frame progress and cooperative cancellation.
//!
//! Only frame sequences take long enough to be worth observing, so only
//! [`ExtractionJob::ExtractFrameSequence`](crate::ExtractionJob) drives a
//! [`ProgressCallback`]. Single frames and clips report through
//! [`JobStatus`](crate::JobStatus) alone.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framecut::{
//!     ExtractionJob, ExtractionPipeline, MediaEngine, MemoryEngine, PipelineOptions,
//!     ProgressCallback, ProgressInfo, SourceMedia,
//! };
//!
//! struct Percent;
//!
//! impl ProgressCallback for Percent {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let (Some(pct), Some(at)) = (info.percentage, info.current_timestamp) {
//!             println!("{pct:5.1}% (frame at {at:.2}s)");
//!         }
//!     }
//! }
//!
//! let mut engine = MemoryEngine::new().with_duration(10.0);
//! engine.load()?;
//! let source = SourceMedia::load(&mut engine, "input.mp4", vec![0; 16])?;
//!
//! let options = PipelineOptions::new().with_progress(Arc::new(Percent));
//! let mut pipeline = ExtractionPipeline::new(&mut engine, options);
//! let job = ExtractionJob::ExtractFrameSequence { start: 0.0, end: 9.0, count: 10 };
//! let _archive = pipeline.run(&source, &job)?;
//! # Ok::<(), framecut::FramecutError>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// What a job does, as reported in [`ProgressInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    FrameExtraction,
    /// Evenly spaced frames packed into one archive.
    FrameSequence,
    ClipCut,
    /// Cut followed by a reverse pass.
    ReversedClipCut,
}

/// Where a job stands after its latest completed frame.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    pub operation: OperationType,
    /// Frames finished so far.
    pub current: u64,
    /// Frames the job will produce, when known up front.
    pub total: Option<u64>,
    /// `current / total` as a percentage.
    pub percentage: Option<f32>,
    pub elapsed: Duration,
    /// Linear extrapolation from the average time per frame so far.
    pub estimated_remaining: Option<Duration>,
    /// Zero-based index of the frame just finished. `None` on the closing
    /// report.
    pub current_frame: Option<u64>,
    /// Position of that frame in the source, in seconds.
    pub current_timestamp: Option<f64>,
}

/// Observer for frame-sequence progress.
///
/// Callbacks observe only; to stop a job, cancel its [`CancellationToken`].
/// With the `async` feature they run on Tokio's blocking pool, hence the
/// `Send + Sync` bound.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Shared flag asking a running job to stop.
///
/// Clones share the flag. The pipeline looks at it before every frame of a
/// sequence and before the reverse pass of a reversed cut; a command that is
/// already running finishes first, and the job's virtual files are removed
/// as usual.
///
/// ```
/// use framecut::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Counts finished frames and calls the callback every `batch_size` frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    batch_size: u64,
    done: u64,
    started: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            batch_size: batch_size.max(1),
            done: 0,
            started: Instant::now(),
        }
    }

    /// Record one finished frame.
    pub(crate) fn advance(&mut self, frame_index: Option<u64>, timestamp: Option<f64>) {
        self.done += 1;
        if self.done % self.batch_size == 0 {
            self.emit(frame_index, timestamp);
        }
    }

    /// Closing report, sent regardless of the batch size.
    pub(crate) fn finish(&self) {
        self.emit(None, None);
    }

    fn emit(&self, current_frame: Option<u64>, current_timestamp: Option<f64>) {
        let elapsed = self.started.elapsed();
        let total = self.total.filter(|total| *total > 0);
        let percentage = total.map(|total| 100.0 * self.done as f32 / total as f32);
        let estimated_remaining = total.filter(|_| self.done > 0).map(|total| {
            let left = total.saturating_sub(self.done);
            elapsed.mul_f64(left as f64 / self.done as f64)
        });

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.done,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame,
            current_timestamp,
        });
    }
}
