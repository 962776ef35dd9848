//! Human-readable job status.
//!
//! The pipeline publishes a [`JobStatus`] at every phase transition of a job
//! (queued, running, per-frame progress, done or failed). A UI either
//! implements [`StatusSink`] itself or polls a shared [`StatusCell`]. Status
//! is advisory: nothing in the pipeline waits on it.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex};

use log::info;

/// The phase a job is in, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobStatus {
    /// No job has been submitted yet.
    #[default]
    Idle,
    /// A job was accepted and is about to start.
    Queued {
        /// Short description of the job.
        message: String,
    },
    /// The job is issuing engine commands.
    Running {
        /// What the job is doing right now.
        message: String,
    },
    /// One item of a multi-item job finished.
    Progress {
        /// Items completed so far, counting the current one.
        current: usize,
        /// Total items in the job.
        total: usize,
        /// What the job is doing right now.
        message: String,
    },
    /// The job finished and its artifact was delivered.
    Done {
        /// Completion message.
        message: String,
    },
    /// The job failed; the message includes the underlying error.
    Failed {
        /// Error message.
        message: String,
    },
    /// The job was cancelled by the user.
    Cancelled {
        /// Cancellation message.
        message: String,
    },
}

impl JobStatus {
    /// Returns `true` once the job has reached a terminal phase.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Done { .. } | JobStatus::Failed { .. } | JobStatus::Cancelled { .. }
        )
    }

    /// Returns `true` while a job is queued or running.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            JobStatus::Queued { .. } | JobStatus::Running { .. } | JobStatus::Progress { .. }
        )
    }

    /// The status line without the phase prefix.
    pub fn message(&self) -> &str {
        match self {
            JobStatus::Idle => "",
            JobStatus::Queued { message }
            | JobStatus::Running { message }
            | JobStatus::Progress { message, .. }
            | JobStatus::Done { message }
            | JobStatus::Failed { message }
            | JobStatus::Cancelled { message } => message,
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Idle => write!(f, "Ready to go!"),
            JobStatus::Progress {
                current,
                total,
                message,
            } => write!(f, "[{current}/{total}] {message}"),
            other => write!(f, "{}", other.message()),
        }
    }
}

/// Receiver of status updates.
pub trait StatusSink: Send + Sync {
    /// Called on every phase transition.
    fn publish(&self, status: &JobStatus);
}

/// Discards every status update.
pub(crate) struct NoOpStatus;

impl StatusSink for NoOpStatus {
    fn publish(&self, _status: &JobStatus) {}
}

/// A shared cell holding the latest published status.
///
/// Cloning the cell shares the underlying value, so the pipeline can publish
/// into one clone while the UI polls another.
///
/// ```
/// use framecut::{JobStatus, StatusCell, StatusSink};
///
/// let cell = StatusCell::new();
/// cell.publish(&JobStatus::Running { message: "Cutting video...".into() });
/// assert_eq!(cell.current().to_string(), "Cutting video...");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatusCell {
    inner: Arc<Mutex<JobStatus>>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the latest status.
    pub fn current(&self) -> JobStatus {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl StatusSink for StatusCell {
    fn publish(&self, status: &JobStatus) {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = status.clone();
    }
}

/// Forwards every status update to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn publish(&self, status: &JobStatus) {
        info!("{status}");
    }
}
