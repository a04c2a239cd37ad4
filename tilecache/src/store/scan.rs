//! Directory scans over the tile hierarchy.
//!
//! These walk the whole store and are O(number of files). They back the
//! metadata endpoints and the `cache stats` command, never the download path.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use super::{TEMP_PREFIX, TILE_EXTENSION};
use crate::coord::{TileCoord, MAX_ZOOM};

/// Inclusive tile index bounds at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileBounds {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileBounds {
    fn single(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }
}

/// Summary of what the store holds, per zoom level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetadata {
    pub zoom_levels: Vec<u8>,
    pub bounds_per_zoom: BTreeMap<u8, TileBounds>,
}

/// Tile count and on-disk size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub tiles: u64,
    pub bytes: u64,
}

/// Parses a path component written the way the store writes it: plain
/// decimal with no sign or leading zeros.
fn parse_canonical<T: FromStr + ToString>(name: &str) -> Option<T> {
    let value = name.parse::<T>().ok()?;
    (value.to_string() == name).then_some(value)
}

/// Numeric subdirectories of `dir` as `(value, path)` pairs.
fn numeric_dirs<T: FromStr + ToString>(dir: &Path) -> Vec<(T, PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let value = parse_canonical(e.file_name().to_str()?)?;
            Some((value, e.path()))
        })
        .collect()
}

/// Zoom directories under `root` within the supported zoom range.
fn zoom_dirs(root: &Path) -> Vec<(u8, PathBuf)> {
    numeric_dirs::<u8>(root)
        .into_iter()
        .filter(|(zoom, _)| *zoom <= MAX_ZOOM)
        .collect()
}

/// Tile files in an `x` column directory as `(y, size)` pairs.
fn tile_files(dir: &Path) -> Vec<(u32, u64)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|e| {
            let name = e.file_name();
            let name = name.to_str()?;
            if name.starts_with(TEMP_PREFIX) {
                return None;
            }
            let y = parse_canonical(name.strip_suffix(TILE_EXTENSION)?.strip_suffix('.')?)?;
            let meta = e.metadata().ok()?;
            meta.is_file().then_some((y, meta.len()))
        })
        .collect()
}

/// Every tile on the grid at `zoom`, with its file size.
///
/// Entries that name a tile outside the grid are skipped.
fn zoom_tiles(zoom_dir: &Path, zoom: u8) -> Vec<(TileCoord, u64)> {
    let mut tiles = Vec::new();
    for (x, column) in numeric_dirs::<u32>(zoom_dir) {
        for (y, size) in tile_files(&column) {
            let tile = TileCoord::new(zoom, x, y);
            if tile.is_valid() {
                tiles.push((tile, size));
            }
        }
    }
    tiles
}

pub(super) fn bounds_for_zoom(root: &Path, zoom: u8) -> Option<TileBounds> {
    let mut bounds: Option<TileBounds> = None;

    for (tile, _) in zoom_tiles(&root.join(zoom.to_string()), zoom) {
        match bounds.as_mut() {
            Some(b) => b.include(tile.x, tile.y),
            None => bounds = Some(TileBounds::single(tile.x, tile.y)),
        }
    }

    bounds
}

pub(super) fn zoom_levels(root: &Path) -> BTreeSet<u8> {
    zoom_dirs(root)
        .into_iter()
        .filter(|(zoom, _)| bounds_for_zoom(root, *zoom).is_some())
        .map(|(zoom, _)| zoom)
        .collect()
}

pub(super) fn metadata(root: &Path) -> StoreMetadata {
    let bounds_per_zoom: BTreeMap<u8, TileBounds> = zoom_dirs(root)
        .into_iter()
        .filter_map(|(zoom, _)| bounds_for_zoom(root, zoom).map(|b| (zoom, b)))
        .collect();

    StoreMetadata {
        zoom_levels: bounds_per_zoom.keys().copied().collect(),
        bounds_per_zoom,
    }
}

pub(super) fn stats(root: &Path) -> StoreStats {
    let mut stats = StoreStats::default();

    for (zoom, zoom_dir) in zoom_dirs(root) {
        for (_, size) in zoom_tiles(&zoom_dir, zoom) {
            stats.tiles += 1;
            stats.bytes += size;
        }
    }

    stats
}
