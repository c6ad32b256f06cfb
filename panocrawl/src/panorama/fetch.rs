//! Concurrent completion pass over a known tile grid.

use super::buffer::{decode_tile, GridIndex, TileBuffer, TileProbe};
use super::discovery::Extent;
use crate::concurrency::{run_bounded, ConcurrencyLimiter};
use crate::provider::TileSource;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Counts from one completion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Tiles requested in this pass
    pub requested: usize,
    /// Tiles decoded into the buffer
    pub fetched: usize,
    /// Tiles that failed, could not be decoded, or were blank
    pub missing: usize,
}

/// Downloads and decodes one tile.
///
/// Fetch errors and undecodable data both come back as a sentinel.
pub(crate) async fn fetch_tile_image<T: TileSource>(
    source: &T,
    pano_id: &str,
    index: GridIndex,
    zoom: u8,
) -> TileProbe {
    match source.fetch_tile(pano_id, index.col, index.row, zoom).await {
        Ok(data) => match tokio::task::spawn_blocking(move || decode_tile(&data)).await {
            Ok(probe) => probe,
            Err(e) => {
                debug!(pano_id = pano_id, tile = %index, error = %e, "Tile decode task failed");
                TileProbe::Sentinel
            }
        },
        Err(e) => {
            trace!(pano_id = pano_id, tile = %index, error = %e, "Tile fetch failed");
            TileProbe::Sentinel
        }
    }
}

/// Fetches every tile of `extent` not in `skip`, into `buffer`.
///
/// Runs under its own limiter so one panorama's fetches never borrow
/// capacity from another's. Individual failures leave gaps and are counted.
pub(crate) async fn fetch_remaining<T: TileSource + 'static>(
    source: &Arc<T>,
    pano_id: &str,
    zoom: u8,
    extent: Extent,
    skip: &HashSet<GridIndex>,
    buffer: &mut TileBuffer,
    concurrency: usize,
) -> FetchStats {
    let limiter = ConcurrencyLimiter::new(concurrency, "tiles");
    let todo: Vec<GridIndex> = extent.indices().filter(|i| !skip.contains(i)).collect();
    let mut stats = FetchStats {
        requested: todo.len(),
        ..Default::default()
    };

    run_bounded(
        &limiter,
        todo,
        |index| {
            let source = Arc::clone(source);
            let pano_id = pano_id.to_string();
            async move {
                let probe = fetch_tile_image(source.as_ref(), &pano_id, index, zoom).await;
                (index, probe)
            }
        },
        |completed| match completed {
            Ok((index, TileProbe::Image(tile))) => {
                buffer.insert(index, tile);
                stats.fetched += 1;
            }
            _ => stats.missing += 1,
        },
    )
    .await;

    debug!(
        pano_id = pano_id,
        requested = stats.requested,
        fetched = stats.fetched,
        missing = stats.missing,
        "Tile completion pass finished"
    );

    stats
}
