//! Concurrent tile download scheduling.
//!
//! A [`DownloadJob`] expands a [`CoverageRequest`](crate::coord::CoverageRequest)
//! into a fixed task list. The [`DownloadScheduler`] drains that list with a
//! pool of worker threads, skipping tiles already in the store and writing new
//! ones atomically. The [`JobManager`] runs at most one job at a time in the
//! background and exposes status polling and cancellation.
//!
//! ```text
//! submit ──► DownloadJob ──► TaskQueue ──► worker × N ──► TileStore
//!                 │                           │
//!                 └──── ProgressCounters ◄────┘
//! ```

mod job;
mod manager;
mod progress;
mod queue;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use job::{DownloadJob, JobId, JobState, JobStatus};
pub use manager::{JobError, JobManager};
pub use progress::{ProgressCounters, ProgressSnapshot, TileOutcome};
pub use queue::TaskQueue;
pub use worker::{DownloadScheduler, SchedulerConfig, DEFAULT_WORKERS};
