//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported slippy-map zoom levels
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Zoom level of the coverage tiling used to list panoramas.
pub const COVERAGE_ZOOM: u8 = 17;

/// Coverage tile in the Web Mercator / Slippy Map system.
///
/// A transient query key for the panorama listing; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoverageTile {
    /// X coordinate (east-west), 0 at west
    pub col: u32,
    /// Y coordinate (north-south), 0 at north
    pub row: u32,
    /// Zoom level
    pub zoom: u8,
}

impl fmt::Display for CoverageTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// Inclusive rectangle of coverage tiles at a single zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub min_col: u32,
    pub min_row: u32,
    pub max_col: u32,
    pub max_row: u32,
    pub zoom: u8,
}

impl TileRect {
    /// Builds the rectangle spanning two corner tiles in any order.
    pub fn spanning(a: CoverageTile, b: CoverageTile) -> Self {
        debug_assert_eq!(a.zoom, b.zoom);
        Self {
            min_col: a.col.min(b.col),
            min_row: a.row.min(b.row),
            max_col: a.col.max(b.col),
            max_row: a.row.max(b.row),
            zoom: a.zoom,
        }
    }

    /// Number of columns in the rectangle.
    #[inline]
    pub fn width(&self) -> u32 {
        self.max_col - self.min_col + 1
    }

    /// Number of rows in the rectangle.
    #[inline]
    pub fn height(&self) -> u32 {
        self.max_row - self.min_row + 1
    }

    /// Total number of tiles.
    #[inline]
    pub fn len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// A rectangle always holds at least one tile.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if the tile lies inside the rectangle.
    pub fn contains(&self, tile: &CoverageTile) -> bool {
        tile.zoom == self.zoom
            && (self.min_col..=self.max_col).contains(&tile.col)
            && (self.min_row..=self.max_row).contains(&tile.row)
    }

    /// Returns an iterator over every tile in the rectangle.
    ///
    /// Tiles are yielded in column-major order (all rows of the first
    /// column, then the next column).
    pub fn tiles(&self) -> TileRectIter {
        TileRectIter {
            rect: *self,
            current: 0,
        }
    }
}

/// Iterator over all tiles in a [`TileRect`].
#[derive(Debug, Clone)]
pub struct TileRectIter {
    rect: TileRect,
    current: usize,
}

impl Iterator for TileRectIter {
    type Item = CoverageTile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.rect.len() {
            return None;
        }

        let height = self.rect.height() as usize;
        let col = self.rect.min_col + (self.current / height) as u32;
        let row = self.rect.min_row + (self.current % height) as u32;
        self.current += 1;

        Some(CoverageTile {
            col,
            row,
            zoom: self.rect.zoom,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rect.len() - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileRectIter {}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range
    InvalidZoom(u8),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
