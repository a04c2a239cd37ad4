//! Test providers for scheduler tests.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::coord::TileCoord;
use crate::provider::{ProviderError, TileProvider};

/// Succeeds for every tile and records what was fetched.
pub struct CountingProvider {
    fetched: Mutex<Vec<TileCoord>>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self {
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().len()
    }

    pub fn fetched(&self) -> Vec<TileCoord> {
        self.fetched.lock().clone()
    }
}

impl TileProvider for CountingProvider {
    fn fetch(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        self.fetched.lock().push(*tile);
        Ok(format!("tile {}", tile).into_bytes())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Fails every fetch with a 503.
pub struct FailingProvider;

impl TileProvider for FailingProvider {
    fn fetch(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::HttpStatus {
            status: 503,
            url: format!("http://tiles/{}", tile),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[derive(Default)]
struct Gate {
    open: bool,
    waiting: usize,
    fetches: usize,
}

/// Blocks every fetch until [`GatedProvider::open`] is called.
pub struct GatedProvider {
    gate: Mutex<Gate>,
    changed: Condvar,
}

impl GatedProvider {
    pub fn new() -> Self {
        Self {
            gate: Mutex::new(Gate::default()),
            changed: Condvar::new(),
        }
    }

    pub fn open(&self) {
        self.gate.lock().open = true;
        self.changed.notify_all();
    }

    pub fn fetch_count(&self) -> usize {
        self.gate.lock().fetches
    }

    /// Waits until `count` fetches are blocked at the gate.
    pub fn wait_for_waiters(&self, count: usize, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        let mut gate = self.gate.lock();
        while gate.waiting < count {
            if self.changed.wait_until(&mut gate, deadline).timed_out() {
                panic!("only {} of {} fetches reached the gate", gate.waiting, count);
            }
        }
    }
}

impl TileProvider for GatedProvider {
    fn fetch(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        let mut gate = self.gate.lock();
        gate.fetches += 1;
        gate.waiting += 1;
        self.changed.notify_all();
        while !gate.open {
            self.changed.wait(&mut gate);
        }
        gate.waiting -= 1;
        Ok(format!("tile {}", tile).into_bytes())
    }

    fn name(&self) -> &str {
        "gated"
    }
}
