//! Download job state: identity, task list, progress and cancellation.

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::progress::ProgressCounters;
use super::queue::TaskQueue;
use crate::coord::{CoordError, CoverageRequest};

/// Identifier assigned to each job by the [`super::JobManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a download job: `Idle → Running → {Completed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl JobState {
    #[inline]
    pub fn is_active(self) -> bool {
        self == JobState::Running
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a job's progress.
///
/// `completed` counts every attempted tile, including skipped and failed
/// ones, so a job whose fetches all failed still ends with
/// `completed == total`. `downloaded` and `failed` break that number down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub job_id: Option<JobId>,
    pub state: JobState,
    pub completed: u64,
    pub total: u64,
    pub downloaded: u64,
    pub failed: u64,
    pub is_active: bool,
}

impl JobStatus {
    /// Status reported before any job has been submitted.
    pub fn idle() -> Self {
        Self {
            job_id: None,
            state: JobState::Idle,
            completed: 0,
            total: 0,
            downloaded: 0,
            failed: 0,
            is_active: false,
        }
    }

    /// Fraction of attempted tiles, 0.0 to 1.0 (1.0 for an empty job).
    pub fn progress_ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// One execution of a coverage request.
///
/// The task list and `total` are fixed at construction; `total` is never
/// recomputed while the job runs.
#[derive(Debug)]
pub struct DownloadJob {
    id: JobId,
    request: CoverageRequest,
    total: u64,
    pub(super) queue: TaskQueue,
    pub(super) progress: ProgressCounters,
    cancel: CancellationToken,
    state: Mutex<JobState>,
}

impl DownloadJob {
    /// Validates `request` and expands it into the job's task list.
    pub fn new(id: JobId, request: CoverageRequest) -> Result<Self, CoordError> {
        let tiles = request.tiles()?;
        let total = tiles.len() as u64;

        Ok(Self {
            id,
            request,
            total,
            queue: TaskQueue::new(tiles),
            progress: ProgressCounters::new(),
            cancel: CancellationToken::new(),
            state: Mutex::new(JobState::Idle),
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn request(&self) -> &CoverageRequest {
        &self.request
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn state(&self) -> JobState {
        *self.state.lock()
    }

    pub(super) fn set_state(&self, state: JobState) {
        *self.state.lock() = state;
    }

    /// Requests cooperative cancellation.
    ///
    /// Workers stop taking new tiles; fetches already in flight finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token that fires when the job is cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Lock-free snapshot of the job's counters.
    pub fn status(&self) -> JobStatus {
        let state = self.state();
        let snapshot = self.progress.snapshot();
        JobStatus {
            job_id: Some(self.id),
            state,
            completed: snapshot.completed,
            total: self.total,
            downloaded: snapshot.downloaded,
            failed: snapshot.failed,
            is_active: state.is_active(),
        }
    }
}
