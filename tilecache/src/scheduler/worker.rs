//! Download scheduler: a fixed pool of worker threads draining a job's
//! task queue.

use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use super::job::{DownloadJob, JobState};
use super::progress::TileOutcome;
use crate::coord::{TileCoord, MAX_REQUEST_TILES};
use crate::provider::TileProvider;
use crate::store::{TileStore, WriteOutcome};

/// Default number of concurrent download workers.
pub const DEFAULT_WORKERS: usize = 20;

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub workers: usize,
    /// Largest request a job may be built from, in tiles.
    pub max_tiles: u64,
}

impl SchedulerConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            ..Self::default()
        }
    }

    /// Sets the tile limit, clamped to `1..=MAX_REQUEST_TILES`.
    pub fn max_tiles(mut self, max_tiles: u64) -> Self {
        self.max_tiles = max_tiles.clamp(1, MAX_REQUEST_TILES);
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_tiles: MAX_REQUEST_TILES,
        }
    }
}

/// Runs download jobs against a provider and a store.
#[derive(Clone)]
pub struct DownloadScheduler {
    store: Arc<TileStore>,
    provider: Arc<dyn TileProvider>,
    config: SchedulerConfig,
}

impl DownloadScheduler {
    pub fn new(
        store: Arc<TileStore>,
        provider: Arc<dyn TileProvider>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config: SchedulerConfig::with_workers(config.workers).max_tiles(config.max_tiles),
        }
    }

    pub fn store(&self) -> &Arc<TileStore> {
        &self.store
    }

    pub fn provider(&self) -> &Arc<dyn TileProvider> {
        &self.provider
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Executes `job` on the calling thread until every tile has been
    /// attempted or the job is cancelled, and returns the terminal state.
    ///
    /// Blocks for the duration of the job. The [`super::JobManager`] calls
    /// this from a dedicated thread so callers can keep polling status.
    pub fn start(&self, job: &DownloadJob) -> JobState {
        job.set_state(JobState::Running);

        let workers = self.config.workers.min(job.total().max(1) as usize);
        info!(
            job_id = %job.id(),
            total = job.total(),
            workers,
            provider = self.provider.name(),
            "Download job started"
        );

        thread::scope(|scope| {
            let mut spawned = 0usize;
            for index in 0..workers {
                let result = thread::Builder::new()
                    .name(format!("tile-worker-{}", index))
                    .spawn_scoped(scope, || self.run_worker(job));
                match result {
                    Ok(_) => spawned += 1,
                    Err(e) => warn!(error = %e, "Failed to spawn download worker"),
                }
            }
            if spawned == 0 {
                self.run_worker(job);
            }
        });

        let state = if job.is_cancelled() {
            JobState::Cancelled
        } else {
            JobState::Completed
        };
        job.set_state(state);

        let status = job.status();
        info!(
            job_id = %job.id(),
            state = %state,
            completed = status.completed,
            total = status.total,
            downloaded = status.downloaded,
            failed = status.failed,
            "Download job finished"
        );

        state
    }

    fn run_worker(&self, job: &DownloadJob) {
        while !job.is_cancelled() {
            let Some(tile) = job.queue.pop() else {
                break;
            };
            // A tile taken after cancellation is dropped, not counted.
            if job.is_cancelled() {
                break;
            }
            let outcome = self.process_tile(&tile);
            job.progress.record(outcome);
        }
    }

    fn process_tile(&self, tile: &TileCoord) -> TileOutcome {
        if self.store.exists(tile) {
            debug!(tile = %tile, "Tile already cached, skipping");
            return TileOutcome::Skipped;
        }

        let data = match self.provider.fetch(tile) {
            Ok(data) => data,
            Err(e) => {
                warn!(tile = %tile, error = %e, "Tile download failed");
                return TileOutcome::Failed;
            }
        };

        match self.store.write(tile, &data) {
            Ok(WriteOutcome::Written) => TileOutcome::Downloaded,
            Ok(WriteOutcome::AlreadyPresent) => {
                debug!(tile = %tile, "Tile written concurrently, keeping existing file");
                TileOutcome::Skipped
            }
            Err(e) => {
                warn!(tile = %tile, error = %e, "Failed to store tile");
                TileOutcome::Failed
            }
        }
    }
}
