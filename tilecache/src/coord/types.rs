//! Coordinate type definitions

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by the tile math.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Largest task list a single coverage request may expand into.
pub const MAX_REQUEST_TILES: u64 = 5_000_000;

/// Equatorial Earth radius in meters (WGS84), used for meter/degree conversion.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north
    pub lat: f64,
    /// Longitude in degrees, positive east
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Tile coordinates in the slippy-map XYZ scheme.
///
/// `x` grows west to east and `y` grows north to south. A tile is valid when
/// both are below `2^zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level (0-22)
    pub zoom: u8,
    /// Column, 0 at the antimeridian (west)
    pub x: u32,
    /// Row, 0 at the north edge
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Returns `true` if the coordinate lies inside the grid for its zoom.
    #[inline]
    pub fn is_valid(&self) -> bool {
        if self.zoom > MAX_ZOOM {
            return false;
        }
        let n = grid_size(self.zoom);
        self.x < n && self.y < n
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom`.
#[inline]
pub fn grid_size(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Axis-aligned geographic box described by its north-west and south-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top_left: GeoPoint,
    pub bottom_right: GeoPoint,
}

/// Half-open block of tiles at a single zoom level.
///
/// Produced by [`super::tile_range`]; never empty and always inside the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub x: Range<u32>,
    pub y: Range<u32>,
}

impl TileRange {
    /// Number of tiles covered by this range.
    #[inline]
    pub fn count(&self) -> u64 {
        self.x.len() as u64 * self.y.len() as u64
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.zoom == self.zoom && self.x.contains(&tile.x) && self.y.contains(&tile.y)
    }

    /// Iterates every tile in the range, column by column.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let zoom = self.zoom;
        self.x
            .clone()
            .flat_map(move |x| self.y.clone().map(move |y| TileCoord { zoom, x, y }))
    }
}

/// Errors that can occur during coordinate conversion and coverage validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside the Mercator-valid range
    #[error("Invalid latitude: {0} (must be between {} and {})", MIN_LAT, MAX_LAT)]
    InvalidLatitude(f64),

    /// Longitude is not a finite number
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// Zoom level is above the supported maximum
    #[error("Invalid zoom level: {0} (must be between {} and {})", MIN_ZOOM, MAX_ZOOM)]
    InvalidZoom(u8),

    /// Minimum zoom is greater than maximum zoom
    #[error("Invalid zoom range: min_zoom {min} is greater than max_zoom {max}")]
    InvalidZoomRange { min: u8, max: u8 },

    /// Area size is zero, negative or not finite
    #[error("Invalid size: {0} meters (must be a positive number)")]
    InvalidSize(f64),

    /// Request covers more tiles than one job may hold
    #[error("Request covers {total} tiles (limit is {max})")]
    TooManyTiles { total: u64, max: u64 },
}
