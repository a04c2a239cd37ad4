//! Shared task list for download workers.

use parking_lot::Mutex;

use crate::coord::TileCoord;

/// Thread-safe list of tiles still to be attempted.
///
/// The lock is held only for the removal itself; no I/O happens under it.
#[derive(Debug)]
pub struct TaskQueue {
    tasks: Mutex<Vec<TileCoord>>,
}

impl TaskQueue {
    /// Creates a queue that hands tiles out in the order given.
    pub fn new(mut tiles: Vec<TileCoord>) -> Self {
        tiles.reverse();
        Self {
            tasks: Mutex::new(tiles),
        }
    }

    /// Takes the next tile, or `None` once the list is exhausted.
    pub fn pop(&self) -> Option<TileCoord> {
        self.tasks.lock().pop()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}
