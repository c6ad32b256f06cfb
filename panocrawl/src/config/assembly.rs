//! Panorama assembly configuration.

use super::defaults::{
    DEFAULT_MAX_PROBES, DEFAULT_PANORAMA_HEIGHT, DEFAULT_PANORAMA_WIDTH, DEFAULT_PANORAMA_ZOOM,
    DEFAULT_SEED_COL, DEFAULT_SEED_ROW, DEFAULT_TILE_CONCURRENCY,
};
use crate::panorama::GridIndex;
use crate::provider::ImageSize;

/// Configuration for assembling one panorama.
///
/// # Example
///
/// ```
/// use panocrawl::config::AssemblyConfig;
///
/// let config = AssemblyConfig::new()
///     .with_width(2048)
///     .with_height(1024)
///     .with_tile_concurrency(16);
/// assert_eq!(config.zoom(), 3);
/// assert_eq!(config.width(), 2048);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Pyramid level to fetch
    zoom: u8,
    /// First tile probed during discovery
    seed: GridIndex,
    /// Sequential probe budget
    max_probes: usize,
    /// Tile fetches in flight during the completion pass
    tile_concurrency: usize,
    /// Canonical output width
    width: u32,
    /// Canonical output height
    height: u32,
}

impl AssemblyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Set the seed tile.
    ///
    /// The seed must lie inside every valid panorama's grid; a blank seed
    /// means the panorama does not exist. It is clamped to the grid of the
    /// configured zoom, see [`AssemblyConfig::seed`].
    pub fn with_seed(mut self, seed: GridIndex) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_probes(mut self, max_probes: usize) -> Self {
        self.max_probes = max_probes.max(1);
        self
    }

    pub fn with_tile_concurrency(mut self, concurrency: usize) -> Self {
        self.tile_concurrency = concurrency.max(1);
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height.max(1);
        self
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Seed tile, clamped into the full pyramid grid at the configured
    /// zoom.
    ///
    /// A full level `z` is `2^z` columns by `2^(z-1)` rows (one row at
    /// zoom 0), so low zooms pull the seed back inside the grid.
    pub fn seed(&self) -> GridIndex {
        let (cols, rows) = grid_dimensions(self.zoom);
        GridIndex::new(
            self.seed.col.min(cols - 1),
            self.seed.row.min(rows - 1),
        )
    }

    pub fn max_probes(&self) -> usize {
        self.max_probes
    }

    pub fn tile_concurrency(&self) -> usize {
        self.tile_concurrency
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Canonical output resolution.
    pub fn canonical_size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Columns and rows of a complete pyramid level.
fn grid_dimensions(zoom: u8) -> (u32, u32) {
    let cols = 1u32 << zoom.min(30);
    (cols, (cols / 2).max(1))
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_PANORAMA_ZOOM,
            seed: GridIndex::new(DEFAULT_SEED_COL, DEFAULT_SEED_ROW),
            max_probes: DEFAULT_MAX_PROBES,
            tile_concurrency: DEFAULT_TILE_CONCURRENCY,
            width: DEFAULT_PANORAMA_WIDTH,
            height: DEFAULT_PANORAMA_HEIGHT,
        }
    }
}
