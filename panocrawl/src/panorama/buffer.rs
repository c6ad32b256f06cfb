//! Per-assembly tile arena.

use image::RgbImage;
use std::collections::BTreeMap;
use std::fmt;

/// Position of a tile within a panorama's pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridIndex {
    pub col: u32,
    pub row: u32,
}

impl GridIndex {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Outcome of fetching and decoding one pyramid tile.
#[derive(Debug, Clone)]
pub enum TileProbe {
    /// A real tile with image content
    Image(RgbImage),
    /// All-zero tile, fetch error or undecodable data
    Sentinel,
}

impl TileProbe {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, TileProbe::Sentinel)
    }
}

/// Decodes tile bytes, classifying black or unreadable tiles as sentinels.
pub fn decode_tile(data: &[u8]) -> TileProbe {
    match image::load_from_memory(data) {
        Ok(decoded) => {
            let tile = decoded.to_rgb8();
            if tile.as_raw().iter().all(|&v| v == 0) {
                TileProbe::Sentinel
            } else {
                TileProbe::Image(tile)
            }
        }
        Err(_) => TileProbe::Sentinel,
    }
}

/// Decoded tiles of one panorama, keyed by grid index.
///
/// Created and dropped within a single assembly.
#[derive(Debug, Default)]
pub struct TileBuffer {
    tiles: BTreeMap<GridIndex, RgbImage>,
}

impl TileBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: GridIndex, tile: RgbImage) {
        self.tiles.insert(index, tile);
    }

    pub fn get(&self, index: GridIndex) -> Option<&RgbImage> {
        self.tiles.get(&index)
    }

    pub fn contains(&self, index: GridIndex) -> bool {
        self.tiles.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridIndex, &RgbImage)> {
        self.tiles.iter().map(|(index, tile)| (*index, tile))
    }

    /// Pixel size of the lowest-indexed tile; all tiles share one size.
    pub fn tile_size(&self) -> Option<(u32, u32)> {
        self.tiles
            .values()
            .next()
            .map(|tile| (tile.width(), tile.height()))
    }
}
