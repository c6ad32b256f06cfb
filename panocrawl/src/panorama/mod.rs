//! Panorama assembly.
//!
//! Rebuilds a full equirectangular image from a panorama's tile pyramid in two
//! stages: a sequential boundary [`discovery`] that finds the grid size, then a
//! concurrent [`fetch`] of the remaining tiles. The collected tiles are
//! [`reconstruct`]ed into one canvas at the canonical resolution.
//!
//! # Outcomes
//!
//! - `Ok(AssembledPanorama)` on success
//! - [`AssemblyError::NotFound`] if the seed tile is blank (removed or invalid id)
//! - [`AssemblyError::Empty`] if the grid was found but the completion pass
//!   retrieved no tiles at all
//!
//! None of these are fatal to a crawl; a failed id is retried next run.

mod buffer;
pub mod discovery;
mod fetch;
pub mod reconstruct;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::{decode_tile, GridIndex, TileBuffer, TileProbe};
pub use discovery::{discover_extent, Discovery, Extent};
pub use fetch::FetchStats;

use crate::config::AssemblyConfig;
use crate::provider::TileSource;
use image::RgbImage;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Assembly failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// Seed tile blank, or the boundary probe ran out of budget
    #[error("panorama {0} not found (no tiles at the seed position)")]
    NotFound(String),

    /// Grid discovered but no tiles could be fetched
    #[error("panorama {0}: no tile data could be retrieved")]
    Empty(String),

    /// The blocking reconstruction task failed
    #[error("panorama {pano_id}: reconstruction failed: {reason}")]
    Reconstruct { pano_id: String, reason: String },
}

/// A reconstructed panorama ready for detection.
#[derive(Debug, Clone)]
pub struct AssembledPanorama {
    /// RGB image at the configured canonical resolution
    pub image: RgbImage,
    /// Discovered tile grid
    pub extent: Extent,
    /// Tiles placed on the canvas
    pub tiles: usize,
    /// Grid positions left blank
    pub missing: usize,
}

/// Assembles panoramas from a tile source.
pub struct PanoramaAssembler<T: TileSource> {
    source: Arc<T>,
    config: AssemblyConfig,
}

impl<T: TileSource + 'static> PanoramaAssembler<T> {
    pub fn new(source: Arc<T>, config: AssemblyConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Discovers, fetches and reconstructs one panorama.
    pub async fn assemble(&self, pano_id: &str) -> Result<AssembledPanorama, AssemblyError> {
        let config = &self.config;
        let Discovery {
            extent,
            mut buffer,
            probed,
        } = discover_extent(
            self.source.as_ref(),
            pano_id,
            config.zoom(),
            config.seed(),
            config.max_probes(),
        )
        .await?;

        let stats = fetch::fetch_remaining(
            &self.source,
            pano_id,
            config.zoom(),
            extent,
            &probed,
            &mut buffer,
            config.tile_concurrency(),
        )
        .await;

        if stats.requested > 0 && stats.fetched == 0 {
            return Err(AssemblyError::Empty(pano_id.to_string()));
        }

        let tiles = buffer.len();
        let missing = extent.len().saturating_sub(tiles);
        let (width, height) = (config.width(), config.height());

        let image = tokio::task::spawn_blocking(move || {
            reconstruct::reconstruct(&buffer, extent, width, height)
        })
        .await
        .map_err(|e| AssemblyError::Reconstruct {
            pano_id: pano_id.to_string(),
            reason: e.to_string(),
        })?
        .ok_or_else(|| AssemblyError::Empty(pano_id.to_string()))?;

        debug!(
            pano_id = pano_id,
            cols = extent.cols(),
            rows = extent.rows(),
            tiles = tiles,
            missing = missing,
            "Panorama assembled"
        );

        Ok(AssembledPanorama {
            image,
            extent,
            tiles,
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::GridTiles;

    fn small_config() -> AssemblyConfig {
        AssemblyConfig::new()
            .with_width(64)
            .with_height(32)
            .with_tile_concurrency(4)
    }

    #[tokio::test]
    async fn test_assemble_standard_grid() {
        let source = Arc::new(GridTiles::new(7, 3));
        let assembler = PanoramaAssembler::new(Arc::clone(&source), small_config());

        let panorama = assembler.assemble("P").await.unwrap();

        assert_eq!(panorama.image.dimensions(), (64, 32));
        assert_eq!(panorama.extent, Extent { max_col: 7, max_row: 3 });
        assert_eq!(panorama.tiles, 32);
        assert_eq!(panorama.missing, 0);
        // 6 probes during discovery, then the 28 tiles not yet seen
        assert_eq!(source.fetches(), 6 + 28);
    }

    #[tokio::test]
    async fn test_partial_failures_leave_blank_regions() {
        let failing = [GridIndex::new(0, 0), GridIndex::new(3, 2), GridIndex::new(7, 0)];
        let source = Arc::new(GridTiles::new(7, 3).with_failures(failing));
        let assembler = PanoramaAssembler::new(
            Arc::clone(&source),
            AssemblyConfig::new().with_width(4096).with_height(2048),
        );

        let panorama = assembler.assemble("P").await.unwrap();

        assert_eq!(panorama.image.dimensions(), (4096, 2048));
        assert_eq!(panorama.tiles, 29);
        assert_eq!(panorama.missing, 3);
    }

    #[tokio::test]
    async fn test_output_size_is_independent_of_grid() {
        for (max_col, max_row) in [(4, 1), (7, 3), (12, 9), (5, 6)] {
            let source = Arc::new(GridTiles::new(max_col, max_row));
            let assembler = PanoramaAssembler::new(source, small_config());
            let panorama = assembler.assemble("P").await.unwrap();
            assert_eq!(panorama.image.dimensions(), (64, 32));
        }
    }

    #[tokio::test]
    async fn test_low_zoom_grids_are_found() {
        for (zoom, max_col, max_row) in [(0, 0, 0), (1, 1, 0), (2, 3, 1)] {
            let source = Arc::new(GridTiles::new(max_col, max_row));
            let assembler = PanoramaAssembler::new(source, small_config().with_zoom(zoom));

            let panorama = assembler.assemble("P").await.unwrap();

            assert_eq!(panorama.extent, Extent { max_col, max_row });
            assert_eq!(panorama.missing, 0);
            assert_eq!(panorama.image.dimensions(), (64, 32));
        }
    }

    #[tokio::test]
    async fn test_not_found_stops_after_seed() {
        let source = Arc::new(GridTiles::new(2, 0));
        let assembler = PanoramaAssembler::new(Arc::clone(&source), small_config());

        let result = assembler.assemble("GONE").await;
        assert_eq!(result.unwrap_err(), AssemblyError::NotFound("GONE".into()));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_empty_when_completion_pass_gets_nothing() {
        let source = Arc::new(GridTiles::new(7, 3).failing_after(6));
        let assembler = PanoramaAssembler::new(Arc::clone(&source), small_config());

        let result = assembler.assemble("P").await;
        assert_eq!(result.unwrap_err(), AssemblyError::Empty("P".into()));
    }
}
