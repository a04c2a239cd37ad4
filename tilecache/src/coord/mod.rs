//! Coordinate conversion module
//!
//! Provides the spherical Web Mercator math shared by the downloader and the
//! tile server: projecting geographic coordinates onto the XYZ tile grid,
//! expanding a center point and size into a bounding box, and turning that
//! box into the block of tiles that covers it at each zoom level.
//!
//! Every tile coordinate in the crate is derived from [`project`], so the
//! tiles a job downloads are exactly the tiles a client will later request.

mod coverage;
mod types;

pub use coverage::CoverageRequest;
pub use types::{
    grid_size, BoundingBox, CoordError, GeoPoint, TileCoord, TileRange, EARTH_RADIUS_M, MAX_LAT,
    MAX_LON, MAX_REQUEST_TILES, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Projects geographic coordinates onto the fractional tile grid.
///
/// Returns `(fx, fy)` where the integer part is the tile column/row and the
/// fraction is the position inside that tile.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees; values outside ±180 are projected as-is
/// * `zoom` - Zoom level (0 to 22)
///
/// # Errors
///
/// `InvalidLatitude` outside the Mercator band (including the poles),
/// `InvalidLongitude` for non-finite longitudes and `InvalidZoom` above
/// [`MAX_ZOOM`].
#[inline]
pub fn project(lat: f64, lon: f64, zoom: u8) -> Result<(f64, f64), CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !lon.is_finite() {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let fx = n * (lon + 180.0) / 360.0;

    let lat_rad = lat.to_radians();
    let fy = n * (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;

    Ok((fx, fy))
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lat, lon)
}

/// Computes the square bounding box centered on `center`.
///
/// `size_meters` is the full side length. Meters are converted to degrees
/// with a flat-earth approximation, valid while the size is small compared
/// to the Earth's radius.
pub fn bounding_box(center: GeoPoint, size_meters: f64) -> Result<BoundingBox, CoordError> {
    if !(size_meters.is_finite() && size_meters > 0.0) {
        return Err(CoordError::InvalidSize(size_meters));
    }
    if !(MIN_LAT..=MAX_LAT).contains(&center.lat) {
        return Err(CoordError::InvalidLatitude(center.lat));
    }
    if !center.lon.is_finite() {
        return Err(CoordError::InvalidLongitude(center.lon));
    }

    let d_lat = (size_meters / EARTH_RADIUS_M).to_degrees();
    let d_lon = (size_meters / (EARTH_RADIUS_M * center.lat.to_radians().cos())).to_degrees();

    Ok(BoundingBox {
        top_left: GeoPoint::new(center.lat + d_lat / 2.0, center.lon - d_lon / 2.0),
        bottom_right: GeoPoint::new(center.lat - d_lat / 2.0, center.lon + d_lon / 2.0),
    })
}

/// Computes the block of tiles covering `bbox` at `zoom`.
///
/// The north-west corner rounds down and the south-east corner rounds up, so
/// partially covered edge tiles are included. The result is clamped into the
/// grid and always holds at least one tile.
pub fn tile_range(bbox: &BoundingBox, zoom: u8) -> Result<TileRange, CoordError> {
    let (tl_x, tl_y) = project(bbox.top_left.lat, bbox.top_left.lon, zoom)?;
    let (br_x, br_y) = project(bbox.bottom_right.lat, bbox.bottom_right.lon, zoom)?;

    let n = grid_size(zoom);
    Ok(TileRange {
        zoom,
        x: clamp_span(tl_x, br_x, n),
        y: clamp_span(tl_y, br_y, n),
    })
}

/// Rounds `[start, end)` outward and clamps it into `[0, n)`, keeping it non-empty.
fn clamp_span(start: f64, end: f64, n: u32) -> std::ops::Range<u32> {
    let last = (n - 1) as f64;
    let lo = start.floor().clamp(0.0, last) as u32;
    let hi = end.ceil().clamp((lo + 1) as f64, n as f64) as u32;
    lo..hi
}
