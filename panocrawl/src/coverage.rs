//! Coverage scanning.
//!
//! Lists every panorama inside a [`GeoArea`] by querying the coverage source
//! once per tile of the area's tile rectangle. The rectangle is a superset of
//! the polygon, so each reported position is re-checked against the polygon
//! itself before it is kept.

use crate::area::GeoArea;
use crate::concurrency::{run_bounded, ConcurrencyLimiter};
use crate::config::ScanConfig;
use crate::coord::CoverageTile;
use crate::provider::{CoverageSource, PanoramaRef, ProviderError};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinates differing by less than this (degrees) are the same position.
const POSITION_TOLERANCE_DEG: f64 = 1e-6;

/// Result of scanning an area.
#[derive(Debug, Clone, Default)]
pub struct CoverageScan {
    panoramas: BTreeMap<String, PanoramaRef>,
    tiles_scanned: usize,
    tiles_failed: usize,
}

impl CoverageScan {
    /// Number of distinct panoramas found.
    pub fn len(&self) -> usize {
        self.panoramas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panoramas.is_empty()
    }

    /// Panorama ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.panoramas.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&PanoramaRef> {
        self.panoramas.get(id)
    }

    pub fn panoramas(&self) -> impl Iterator<Item = &PanoramaRef> {
        self.panoramas.values()
    }

    /// Number of coverage tiles queried.
    pub fn tiles_scanned(&self) -> usize {
        self.tiles_scanned
    }

    /// Number of coverage tiles whose query failed (treated as empty).
    pub fn tiles_failed(&self) -> usize {
        self.tiles_failed
    }

    /// Adds a panorama, keeping the first-seen position for a known id.
    fn merge(&mut self, panorama: PanoramaRef) {
        match self.panoramas.entry(panorama.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(panorama);
            }
            Entry::Occupied(existing) => {
                let kept = existing.get();
                if (kept.lat - panorama.lat).abs() > POSITION_TOLERANCE_DEG
                    || (kept.lon - panorama.lon).abs() > POSITION_TOLERANCE_DEG
                {
                    warn!(
                        pano_id = %panorama.id,
                        kept_lat = kept.lat,
                        kept_lon = kept.lon,
                        lat = panorama.lat,
                        lon = panorama.lon,
                        "Panorama reported at two positions, keeping the first"
                    );
                }
            }
        }
    }
}

/// Scans an area's coverage tiles with bounded concurrency.
pub struct CoverageScanner<S: CoverageSource> {
    source: Arc<S>,
    config: ScanConfig,
}

impl<S: CoverageSource + 'static> CoverageScanner<S> {
    pub fn new(source: Arc<S>, config: ScanConfig) -> Self {
        Self { source, config }
    }

    /// Queries every tile in the area's rectangle and returns the panoramas
    /// that lie inside the polygon.
    ///
    /// A failing tile contributes nothing and is not retried; the scan
    /// always runs to completion.
    pub async fn scan(&self, area: &GeoArea) -> CoverageScan {
        let rect = area.tile_rect();
        let limiter = ConcurrencyLimiter::new(self.config.concurrency(), "coverage");
        let mut scan = CoverageScan::default();
        let mut outside = 0usize;

        info!(
            tiles = rect.len(),
            concurrency = limiter.max_concurrent(),
            "Scanning coverage tiles"
        );

        run_bounded(
            &limiter,
            rect.tiles(),
            |tile| {
                let source = Arc::clone(&self.source);
                async move { (tile, source.list_panoramas(tile).await) }
            },
            |completed| {
                scan.tiles_scanned += 1;
                match completed {
                    Ok((_, Ok(panoramas))) => {
                        for panorama in panoramas {
                            if area.contains(panorama.lat, panorama.lon) {
                                scan.merge(panorama);
                            } else {
                                outside += 1;
                            }
                        }
                    }
                    Ok((tile, Err(e))) => {
                        scan.tiles_failed += 1;
                        log_tile_failure(tile, &e);
                    }
                    Err(_) => scan.tiles_failed += 1,
                }
            },
        )
        .await;

        info!(
            found = scan.len(),
            tiles = scan.tiles_scanned,
            failed_tiles = scan.tiles_failed,
            outside_polygon = outside,
            peak_in_flight = limiter.peak_in_flight(),
            "Coverage scan complete"
        );

        scan
    }
}

fn log_tile_failure(tile: CoverageTile, error: &ProviderError) {
    debug!(
        tile_col = tile.col,
        tile_row = tile.row,
        error = %error,
        "Coverage query failed, treating tile as empty"
    );
}
