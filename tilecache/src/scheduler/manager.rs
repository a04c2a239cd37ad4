//! Single-job coordinator shared by the HTTP server and the CLI.
//!
//! At most one job runs at a time. A submission while a job is running is
//! rejected with [`JobError::AlreadyRunning`]; the running job is never
//! replaced.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{error, info};

use super::job::{DownloadJob, JobId, JobState, JobStatus};
use super::worker::DownloadScheduler;
use crate::coord::{CoordError, CoverageRequest};

/// Errors from submitting a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] CoordError),

    #[error("Download job {0} is already running")]
    AlreadyRunning(JobId),

    #[error("Failed to spawn job thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Owns the current job and the thread running it.
pub struct JobManager {
    scheduler: DownloadScheduler,
    current: Mutex<Option<Arc<DownloadJob>>>,
    handle: Mutex<Option<JoinHandle<JobState>>>,
    /// Serializes submissions; `current` is only locked to read or install.
    submitting: Mutex<()>,
    next_id: AtomicU64,
}

impl JobManager {
    pub fn new(scheduler: DownloadScheduler) -> Self {
        Self {
            scheduler,
            current: Mutex::new(None),
            handle: Mutex::new(None),
            submitting: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn scheduler(&self) -> &DownloadScheduler {
        &self.scheduler
    }

    /// Validates `request` and starts it in the background.
    ///
    /// Returns the new job's initial status (state `running`, `total` fixed).
    /// Nothing is started when validation fails or another job is active.
    pub fn submit(&self, request: CoverageRequest) -> Result<JobStatus, JobError> {
        request.validate_within(self.scheduler.config().max_tiles)?;

        // The task list is built outside `current` so status and cancel stay
        // responsive while a large job is being prepared.
        let _submitting = self.submitting.lock();
        if let Some(id) = self.active_job_id() {
            return Err(JobError::AlreadyRunning(id));
        }

        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let job = Arc::new(DownloadJob::new(id, request)?);
        // Visible as running before the thread picks it up.
        job.set_state(JobState::Running);

        let scheduler = self.scheduler.clone();
        let worker_job = Arc::clone(&job);
        let handle = thread::Builder::new()
            .name(format!("tile-job-{}", id))
            .spawn(move || {
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| scheduler.start(&worker_job)));
                match result {
                    Ok(state) => state,
                    Err(_) => {
                        error!(job_id = %worker_job.id(), "Download job panicked");
                        let state = if worker_job.is_cancelled() {
                            JobState::Cancelled
                        } else {
                            JobState::Completed
                        };
                        worker_job.set_state(state);
                        state
                    }
                }
            })
            .map_err(JobError::Spawn)?;

        let status = job.status();
        *self.current.lock() = Some(job);
        *self.handle.lock() = Some(handle);

        info!(job_id = %id, total = status.total, "Download job submitted");
        Ok(status)
    }

    fn active_job_id(&self) -> Option<JobId> {
        let current = self.current.lock();
        let job = current.as_ref()?;
        job.state().is_active().then(|| job.id())
    }

    /// Requests cancellation of the running job.
    ///
    /// Returns the job's id, or `None` when nothing is running.
    pub fn cancel(&self) -> Option<JobId> {
        let current = self.current.lock();
        let job = current.as_ref()?;
        if !job.state().is_active() {
            return None;
        }
        job.cancel();
        info!(job_id = %job.id(), "Download job cancellation requested");
        Some(job.id())
    }

    /// Status of the current or most recent job.
    pub fn status(&self) -> JobStatus {
        self.current
            .lock()
            .as_ref()
            .map(|job| job.status())
            .unwrap_or_else(JobStatus::idle)
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active
    }

    /// Blocks until the current job's thread exits and returns its final
    /// status.
    pub fn wait(&self) -> JobStatus {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Download job thread terminated abnormally");
            }
        }
        self.status()
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        if let Some(job) = self.current.get_mut().as_ref() {
            job.cancel();
        }
    }
}
