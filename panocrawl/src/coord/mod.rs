//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator slippy-map tiles used to query panorama coverage.

mod types;


pub use types::{
    CoordError, CoverageTile, TileRect, TileRectIter, COVERAGE_ZOOM, MAX_LAT, MAX_LON, MAX_ZOOM,
    MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are invalid.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<CoverageTile, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let last = (1u64 << zoom) as u32 - 1;

    let col = ((lon + 180.0) / 360.0 * n) as u32;

    let lat_rad = lat * PI / 180.0;
    let row = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32;

    // lon = 180 and lat = MIN_LAT land exactly on the far edge
    Ok(CoverageTile {
        col: col.min(last),
        row: row.min(last),
        zoom,
    })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &CoverageTile) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.col as f64 / n * 360.0 - 180.0;

    let y = tile.row as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Computes the inclusive tile rectangle covering a lon/lat bounding box.
///
/// The north-west corner (`max_lat`, `min_lon`) and the south-east corner
/// (`min_lat`, `max_lon`) are converted independently; the result spans both.
pub fn bbox_to_tile_rect(
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
    zoom: u8,
) -> Result<TileRect, CoordError> {
    let north_west = to_tile_coords(max_lat, min_lon, zoom)?;
    let south_east = to_tile_coords(min_lat, max_lon, zoom)?;
    Ok(TileRect::spanning(north_west, south_east))
}
