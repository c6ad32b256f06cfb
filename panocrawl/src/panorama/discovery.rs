//! Sequential tile-grid boundary discovery.
//!
//! The size of a panorama's tile grid is not published, so it is found by
//! probing the tile server. Tiles outside the grid come back as sentinels
//! (see [`TileProbe`]). Starting at a seed inside the grid:
//!
//! 1. Walk diagonally (`col + 1`, `row + 1`) until the first sentinel at
//!    `(c, r)`.
//! 2. Probe `(c, r - 1)`, the tile directly above it.
//!    - Not a sentinel: the walk left through the bottom edge, so the last
//!      row is `r - 1`. Sweep columns forward along that row; the column
//!      before the next sentinel is the last column.
//!    - Sentinel: the walk left through the right edge, so the last column
//!      is `c - 1`. Sweep rows downward along that column; the row before
//!      the next sentinel is the last row.
//!
//! Each probe depends on the previous result, so this stage is strictly
//! sequential. Every probed tile is cached for the completion pass.

use super::buffer::{GridIndex, TileBuffer, TileProbe};
use super::fetch::fetch_tile_image;
use super::AssemblyError;
use crate::provider::TileSource;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Inclusive bounds of a tile grid: `[0, max_col] x [0, max_row]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub max_col: u32,
    pub max_row: u32,
}

impl Extent {
    /// Number of columns.
    pub fn cols(&self) -> u32 {
        self.max_col + 1
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.max_row + 1
    }

    /// Total tile count.
    pub fn len(&self) -> usize {
        self.cols() as usize * self.rows() as usize
    }

    /// An extent always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every grid index in row-major order.
    pub fn indices(&self) -> impl Iterator<Item = GridIndex> {
        let cols = self.cols();
        (0..self.rows()).flat_map(move |row| (0..cols).map(move |col| GridIndex::new(col, row)))
    }
}

/// Result of a successful discovery.
#[derive(Debug)]
pub struct Discovery {
    pub extent: Extent,
    /// Non-sentinel tiles fetched while probing
    pub buffer: TileBuffer,
    /// Every index probed, sentinel or not
    pub probed: HashSet<GridIndex>,
}

impl Discovery {
    /// Number of fetches issued.
    pub fn probes(&self) -> usize {
        self.probed.len()
    }
}

/// Fetches probe tiles, caching results and enforcing the probe budget.
struct Prober<'a, T: TileSource> {
    source: &'a T,
    pano_id: &'a str,
    zoom: u8,
    max_probes: usize,
    buffer: TileBuffer,
    probed: HashSet<GridIndex>,
}

impl<'a, T: TileSource> Prober<'a, T> {
    /// Returns true if the tile holds image content.
    async fn has_tile(&mut self, col: u32, row: u32) -> Result<bool, AssemblyError> {
        let index = GridIndex::new(col, row);
        if self.buffer.contains(index) {
            return Ok(true);
        }
        if self.probed.contains(&index) {
            return Ok(false);
        }
        if self.probed.len() >= self.max_probes {
            debug!(
                pano_id = self.pano_id,
                max_probes = self.max_probes,
                "Boundary probe budget exhausted"
            );
            return Err(AssemblyError::NotFound(self.pano_id.to_string()));
        }

        self.probed.insert(index);
        let probe = fetch_tile_image(self.source, self.pano_id, index, self.zoom).await;
        trace!(pano_id = self.pano_id, tile = %index, sentinel = probe.is_sentinel(), "Probed tile");

        match probe {
            TileProbe::Image(tile) => {
                self.buffer.insert(index, tile);
                Ok(true)
            }
            TileProbe::Sentinel => Ok(false),
        }
    }
}

/// Discovers the tile grid of a panorama.
///
/// Returns [`AssemblyError::NotFound`] if the seed tile is a sentinel (after
/// exactly one fetch) or if the probe budget runs out.
pub async fn discover_extent<T: TileSource>(
    source: &T,
    pano_id: &str,
    zoom: u8,
    seed: GridIndex,
    max_probes: usize,
) -> Result<Discovery, AssemblyError> {
    let mut prober = Prober {
        source,
        pano_id,
        zoom,
        max_probes: max_probes.max(1),
        buffer: TileBuffer::new(),
        probed: HashSet::new(),
    };

    if !prober.has_tile(seed.col, seed.row).await? {
        debug!(pano_id = pano_id, seed = %seed, "Seed tile is blank");
        return Err(AssemblyError::NotFound(pano_id.to_string()));
    }

    let (mut col, mut row) = (seed.col, seed.row);
    loop {
        col += 1;
        row += 1;
        if !prober.has_tile(col, row).await? {
            break;
        }
    }

    let extent = if prober.has_tile(col, row - 1).await? {
        let max_row = row - 1;
        let mut c = col;
        loop {
            c += 1;
            if !prober.has_tile(c, max_row).await? {
                break;
            }
        }
        Extent {
            max_col: c - 1,
            max_row,
        }
    } else {
        let max_col = col - 1;
        let mut r = row - 1;
        loop {
            r += 1;
            if !prober.has_tile(max_col, r).await? {
                break;
            }
        }
        Extent {
            max_col,
            max_row: r - 1,
        }
    };

    debug!(
        pano_id = pano_id,
        max_col = extent.max_col,
        max_row = extent.max_row,
        probes = prober.probed.len(),
        "Tile grid discovered"
    );

    Ok(Discovery {
        extent,
        buffer: prober.buffer,
        probed: prober.probed,
    })
}
