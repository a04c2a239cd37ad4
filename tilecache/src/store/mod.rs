//! On-disk tile store.
//!
//! Tiles live in a plain `root/{z}/{x}/{y}.png` hierarchy, the same layout
//! slippy-map tools and tile servers use, so the cache directory can be read
//! by external tools as well as by the [`crate::server`].
//!
//! # Write contract
//!
//! Each tile is written to a temporary file in its target directory and then
//! linked into place without replacing an existing file. Readers therefore
//! see either the complete tile or no tile at all, and once a tile exists its
//! bytes never change. There is no index or metadata file: the presence of
//! the file is the only record that a tile has been downloaded.

mod scan;

pub use scan::{StoreMetadata, StoreStats, TileBounds};

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

use crate::coord::TileCoord;

/// File extension of stored tiles.
pub const TILE_EXTENSION: &str = "png";

/// Prefix of in-progress temporary files; skipped by directory scans.
const TEMP_PREFIX: &str = ".tile-";

/// Errors that can occur while reading or writing tiles.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The tile is not in the store.
    #[error("Tile {0} not found")]
    NotFound(TileCoord),

    /// Filesystem failure.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of [`TileStore::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The tile was stored.
    Written,
    /// A tile was already present; its bytes were left untouched.
    AlreadyPresent,
}

/// Write-once tile cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    /// Creates a store rooted at `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a store and makes sure its root directory exists.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root).map_err(|e| StoreError::io(&store.root, e))?;
        Ok(store)
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a tile: `root/{z}/{x}/{y}.png`.
    pub fn path(&self, tile: &TileCoord) -> PathBuf {
        self.root
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.{}", tile.y, TILE_EXTENSION))
    }

    /// Returns `true` if the tile is fully written.
    pub fn exists(&self, tile: &TileCoord) -> bool {
        self.path(tile).is_file()
    }

    /// Reads a tile's bytes.
    pub fn read(&self, tile: &TileCoord) -> Result<Vec<u8>, StoreError> {
        let path = self.path(tile);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(*tile),
            _ => StoreError::io(&path, e),
        })
    }

    /// Stores a tile atomically.
    ///
    /// Intermediate directories are created on demand. If the tile already
    /// exists, or another writer wins the race, the existing file is kept and
    /// [`WriteOutcome::AlreadyPresent`] is returned.
    pub fn write(&self, tile: &TileCoord, data: &[u8]) -> Result<WriteOutcome, StoreError> {
        let path = self.path(tile);
        if path.is_file() {
            return Ok(WriteOutcome::AlreadyPresent);
        }

        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(|e| StoreError::io(dir, e))?;
        if let Err(e) = temp.write_all(data).and_then(|()| temp.flush()) {
            return Err(StoreError::io(temp.path(), e));
        }

        match temp.persist_noclobber(&path) {
            Ok(_) => {
                trace!(tile = %tile, bytes = data.len(), "Tile stored");
                Ok(WriteOutcome::Written)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(WriteOutcome::AlreadyPresent)
            }
            Err(e) => Err(StoreError::io(&path, e.error)),
        }
    }

    /// Zoom levels that currently hold at least one tile.
    pub fn available_zoom_levels(&self) -> BTreeSet<u8> {
        scan::zoom_levels(&self.root)
    }

    /// Inclusive tile bounds of everything stored at `zoom`, if anything is.
    pub fn tile_bounds_for_zoom(&self, zoom: u8) -> Option<TileBounds> {
        scan::bounds_for_zoom(&self.root, zoom)
    }

    /// Zoom levels and per-zoom bounds in one pass over the store.
    pub fn metadata(&self) -> StoreMetadata {
        scan::metadata(&self.root)
    }

    /// Number of tiles and bytes on disk.
    pub fn stats(&self) -> StoreStats {
        scan::stats(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn store() -> (TempDir, TileStore) {
        let dir = TempDir::new().unwrap();
        let store = TileStore::open(dir.path().join("tiles")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_path_layout() {
        let store = TileStore::new("/cache");
        let path = store.path(&TileCoord::new(10, 301, 384));
        assert_eq!(path, PathBuf::from("/cache/10/301/384.png"));
    }

    #[test]
    fn test_path_is_collision_free() {
        let store = TileStore::new("/cache");
        // Concatenations like 1/11/1 vs 11/1/1 must not collide
        let a = store.path(&TileCoord::new(1, 11, 1));
        let b = store.path(&TileCoord::new(11, 1, 1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("a").join("b");
        let store = TileStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_read_missing_tile() {
        let (_dir, store) = store();
        let tile = TileCoord::new(3, 1, 2);

        assert!(!store.exists(&tile));
        assert!(matches!(store.read(&tile), Err(StoreError::NotFound(t)) if t == tile));
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, store) = store();
        let tile = TileCoord::new(12, 1205, 1539);

        let outcome = store.write(&tile, b"tile-bytes").unwrap();

        assert_eq!(outcome, WriteOutcome::Written);
        assert!(store.exists(&tile));
        assert_eq!(store.read(&tile).unwrap(), b"tile-bytes");
    }

    #[test]
    fn test_write_is_write_once() {
        let (_dir, store) = store();
        let tile = TileCoord::new(5, 3, 4);

        store.write(&tile, b"first").unwrap();
        let outcome = store.write(&tile, b"second").unwrap();

        assert_eq!(outcome, WriteOutcome::AlreadyPresent);
        assert_eq!(store.read(&tile).unwrap(), b"first");
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let (_dir, store) = store();
        let tile = TileCoord::new(5, 3, 4);
        store.write(&tile, b"data").unwrap();

        let dir = store.path(&tile).parent().unwrap().to_path_buf();
        let names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["4.png".to_string()]);
    }

    #[test]
    fn test_concurrent_writers_single_winner() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        let tile = TileCoord::new(8, 10, 20);

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.write(&tile, &[i; 64]).unwrap())
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let written = outcomes
            .iter()
            .filter(|o| **o == WriteOutcome::Written)
            .count();
        assert_eq!(written, 1);

        let data = store.read(&tile).unwrap();
        assert_eq!(data.len(), 64);
        assert!(data.iter().all(|b| *b == data[0]), "tile bytes were mixed");
    }

    #[test]
    fn test_empty_store_introspection() {
        let (_dir, store) = store();
        assert!(store.available_zoom_levels().is_empty());
        assert_eq!(store.tile_bounds_for_zoom(3), None);
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[test]
    fn test_zoom_levels_and_bounds() {
        let (_dir, store) = store();
        for tile in [
            TileCoord::new(10, 301, 384),
            TileCoord::new(10, 301, 385),
            TileCoord::new(11, 602, 769),
            TileCoord::new(11, 603, 770),
        ] {
            store.write(&tile, b"x").unwrap();
        }

        let zooms: Vec<_> = store.available_zoom_levels().into_iter().collect();
        assert_eq!(zooms, vec![10, 11]);

        assert_eq!(
            store.tile_bounds_for_zoom(11),
            Some(TileBounds {
                min_x: 602,
                max_x: 603,
                min_y: 769,
                max_y: 770,
            })
        );
        assert_eq!(store.tile_bounds_for_zoom(12), None);

        let stats = store.stats();
        assert_eq!(stats.tiles, 4);
        assert_eq!(stats.bytes, 4);
    }
}
