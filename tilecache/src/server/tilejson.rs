//! TileJSON 2.2.0 description of the cache.

use serde::Serialize;

use crate::coord::{
    grid_size, tile_to_lat_lon, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
};
use crate::store::StoreMetadata;

pub const TILEJSON_VERSION: &str = "2.2.0";

/// Fields of the TileJSON document that come from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileJsonSettings {
    pub name: String,
    pub attribution: String,
    /// Base URL clients use to reach this server, without trailing slash.
    pub public_url: String,
}

impl Default for TileJsonSettings {
    fn default() -> Self {
        Self {
            name: "tilecache".to_string(),
            attribution: String::new(),
            public_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileJson {
    pub tilejson: &'static str,
    pub name: String,
    pub attribution: String,
    pub scheme: &'static str,
    pub tiles: Vec<String>,
    pub minzoom: u8,
    pub maxzoom: u8,
    /// `[west, south, east, north]` in degrees.
    pub bounds: [f64; 4],
}

impl TileJson {
    /// Describes the cached tiles.
    ///
    /// Zoom range covers the cached levels and bounds come from the highest
    /// cached zoom. An empty cache advertises the whole world.
    pub fn build(settings: &TileJsonSettings, metadata: &StoreMetadata) -> Self {
        let base = settings.public_url.trim_end_matches('/');

        let (minzoom, maxzoom) = match (metadata.zoom_levels.first(), metadata.zoom_levels.last()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => (0, MAX_ZOOM),
        };

        let bounds = metadata
            .bounds_per_zoom
            .iter()
            .next_back()
            .map(|(&zoom, b)| {
                let (north, west) = tile_to_lat_lon(&TileCoord::new(zoom, b.min_x, b.min_y));
                // South-east corner of the last tile, kept on the grid.
                let edge = grid_size(zoom.min(MAX_ZOOM));
                let (south, east) = tile_to_lat_lon(&TileCoord::new(
                    zoom,
                    b.max_x.saturating_add(1).min(edge),
                    b.max_y.saturating_add(1).min(edge),
                ));
                [west, south, east, north]
            })
            .unwrap_or([MIN_LON, MIN_LAT, MAX_LON, MAX_LAT]);

        Self {
            tilejson: TILEJSON_VERSION,
            name: settings.name.clone(),
            attribution: settings.attribution.clone(),
            scheme: "xyz",
            tiles: vec![format!("{}/tiles/{{z}}/{{x}}/{{y}}.png", base)],
            minzoom,
            maxzoom,
            bounds,
        }
    }
}
