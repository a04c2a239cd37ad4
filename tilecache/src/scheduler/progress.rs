//! Progress counters for download jobs.
//!
//! Counters are plain atomics, independent of the task queue lock, so
//! recording progress never blocks a worker that is taking its next tile.

use std::sync::atomic::{AtomicU64, Ordering};

/// What happened to a single attempted tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    /// Already in the store; nothing fetched.
    Skipped,
    /// Fetched and stored.
    Downloaded,
    /// Fetch or store failed; the tile stays missing.
    Failed,
}

/// Values read from [`ProgressCounters`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: u64,
    pub downloaded: u64,
    pub failed: u64,
}

/// Shared progress counters for one job.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    completed: AtomicU64,
    downloaded: AtomicU64,
    failed: AtomicU64,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one attempted tile.
    ///
    /// The breakdown counter is bumped before `completed`, so a snapshot
    /// never shows more downloaded or failed tiles than completed ones.
    pub fn record(&self, outcome: TileOutcome) {
        match outcome {
            TileOutcome::Skipped => {}
            TileOutcome::Downloaded => {
                self.downloaded.fetch_add(1, Ordering::SeqCst);
            }
            TileOutcome::Failed => {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let completed = self.completed.load(Ordering::SeqCst);
        ProgressSnapshot {
            completed,
            downloaded: self.downloaded.load(Ordering::SeqCst).min(completed),
            failed: self.failed.load(Ordering::SeqCst).min(completed),
        }
    }
}
