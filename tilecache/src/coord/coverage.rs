//! Coverage requests: a center, a size and a zoom range expanded into tiles.

use serde::{Deserialize, Serialize};

use super::types::{
    BoundingBox, CoordError, GeoPoint, TileCoord, TileRange, MAX_REQUEST_TILES, MAX_ZOOM,
};
use super::{bounding_box, tile_range};

/// The immutable input of one download job.
///
/// Describes a square area of `size_meters` per side centered on `center`,
/// to be cached at every zoom level in `min_zoom..=max_zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageRequest {
    pub center: GeoPoint,
    pub size_meters: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl CoverageRequest {
    pub fn new(center: GeoPoint, size_meters: f64, min_zoom: u8, max_zoom: u8) -> Self {
        Self {
            center,
            size_meters,
            min_zoom,
            max_zoom,
        }
    }

    /// Checks the request before any work is scheduled.
    ///
    /// Besides the individual fields, the bounding box corners are projected
    /// so that a box spilling past the Mercator band is rejected here rather
    /// than halfway through a download. The tile count is capped at
    /// [`MAX_REQUEST_TILES`].
    pub fn validate(&self) -> Result<(), CoordError> {
        self.validate_within(MAX_REQUEST_TILES).map(|_| ())
    }

    /// Like [`validate`](Self::validate) with a caller-chosen tile limit.
    ///
    /// Returns the total tile count. The count is computed from the per-zoom
    /// ranges, so an oversized request is rejected without allocating.
    pub fn validate_within(&self, max_tiles: u64) -> Result<u64, CoordError> {
        let total = self.total_tile_count()?;
        let max = max_tiles.min(MAX_REQUEST_TILES);
        if total > max {
            return Err(CoordError::TooManyTiles { total, max });
        }
        Ok(total)
    }

    /// The square bounding box of the request.
    pub fn bounding_box(&self) -> Result<BoundingBox, CoordError> {
        bounding_box(self.center, self.size_meters)
    }

    /// Tile ranges for every zoom level, lowest zoom first.
    ///
    /// Checks the fields but not the tile limit, so oversized requests can
    /// still be planned.
    pub fn tile_ranges(&self) -> Result<Vec<TileRange>, CoordError> {
        if self.min_zoom > self.max_zoom {
            return Err(CoordError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if self.max_zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(self.max_zoom));
        }

        let bbox = self.bounding_box()?;
        (self.min_zoom..=self.max_zoom)
            .map(|zoom| tile_range(&bbox, zoom))
            .collect()
    }

    /// Total number of tiles the request covers across all zoom levels.
    ///
    /// Pure function of the request; no tile store or network access.
    pub fn total_tile_count(&self) -> Result<u64, CoordError> {
        Ok(self.tile_ranges()?.iter().map(TileRange::count).sum())
    }

    /// Flat list of every tile across all zoom levels.
    ///
    /// Fails with [`CoordError::TooManyTiles`] instead of allocating a list
    /// larger than [`MAX_REQUEST_TILES`].
    pub fn tiles(&self) -> Result<Vec<TileCoord>, CoordError> {
        let capacity = self.validate_within(MAX_REQUEST_TILES)? as usize;
        let ranges = self.tile_ranges()?;

        let mut tiles = Vec::with_capacity(capacity);
        for range in &ranges {
            tiles.extend(range.tiles());
        }
        Ok(tiles)
    }
}
