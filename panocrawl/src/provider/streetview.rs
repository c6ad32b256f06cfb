//! Street View panorama provider.
//!
//! Implements coverage listing, pyramid tile download and metadata lookup
//! against the public Maps endpoints.
//!
//! # API Endpoints
//!
//! - Coverage: `https://www.google.com/maps/photometa/ac/v1?pb=...` (one call per zoom-17 tile)
//! - Tiles: `https://streetviewpixels-pa.googleapis.com/v1/tile?...&panoid={id}&x={x}&y={y}&zoom={z}`
//! - Metadata: `https://www.google.com/maps/photometa/v1?...`
//!
//! Coverage and metadata responses are nested positional JSON arrays behind
//! an anti-hijacking `)]}'` prefix. Optional fields are read with
//! [`pointer`] and default to empty when absent.

use crate::coord::CoverageTile;
use crate::provider::{
    AsyncHttpClient, CoverageSource, HistoryEntry, ImageSize, MetadataSource, PanoramaLink,
    PanoramaMetadata, PanoramaRef, ProviderError, TileSource,
};
use serde_json::Value;
use tracing::trace;

const COVERAGE_URL: &str = "https://www.google.com/maps/photometa/ac/v1";
const TILE_URL: &str = "https://streetviewpixels-pa.googleapis.com/v1/tile";
const METADATA_URL: &str = "https://www.google.com/maps/photometa/v1";

/// Prefix prepended to JSON responses to prevent script inclusion.
const XSSI_PREFIX: &str = ")]}'";

/// Street View provider generic over the HTTP client.
pub struct StreetViewProvider<C: AsyncHttpClient> {
    http_client: C,
}

impl<C: AsyncHttpClient> StreetViewProvider<C> {
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    fn coverage_url(tile: &CoverageTile) -> String {
        format!(
            "{}?pb=!1m1!1smaps_sv.tactile!6m3!1i{}!2i{}!3i{}!8b1",
            COVERAGE_URL, tile.col, tile.row, tile.zoom
        )
    }

    fn tile_url(pano_id: &str, col: u32, row: u32, zoom: u8) -> String {
        format!(
            "{}?cb_client=maps_sv.tactile&panoid={}&x={}&y={}&zoom={}",
            TILE_URL, pano_id, col, row, zoom
        )
    }

    fn metadata_url(pano_id: &str) -> String {
        format!(
            "{}?authuser=0&hl=en&gl=us&pb=!1m4!1smaps_sv.tactile!11m2!2m1!1b1!2m2!1sen!2sus\
             !3m3!1m2!1e2!2s{}!4m57!1e1!1e2!1e3!1e4!1e5!1e6!1e8!1e12!2m1!1e1!4m1!1i48!5m1!1e1\
             !5m1!1e2!6m1!1e1!6m1!1e2!9m36!1m3!1e2!2b1!3e2!1m3!1e2!2b0!3e3!1m3!1e3!2b1!3e2\
             !1m3!1e3!2b0!3e3!1m3!1e8!2b0!3e3!1m3!1e1!2b0!3e3!1m3!1e4!2b0!3e3!1m3!1e10!2b1\
             !3e2!1m3!1e10!2b0!3e3",
            METADATA_URL, pano_id
        )
    }
}

impl<C: AsyncHttpClient> CoverageSource for StreetViewProvider<C> {
    async fn list_panoramas(&self, tile: CoverageTile) -> Result<Vec<PanoramaRef>, ProviderError> {
        let body = self.http_client.get(&Self::coverage_url(&tile)).await?;
        let panoramas = parse_coverage(&body)?;
        trace!(tile = %tile, count = panoramas.len(), "Coverage tile listed");
        Ok(panoramas)
    }
}

impl<C: AsyncHttpClient> TileSource for StreetViewProvider<C> {
    async fn fetch_tile(
        &self,
        pano_id: &str,
        col: u32,
        row: u32,
        zoom: u8,
    ) -> Result<Vec<u8>, ProviderError> {
        self.http_client
            .get(&Self::tile_url(pano_id, col, row, zoom))
            .await
    }
}

impl<C: AsyncHttpClient> MetadataSource for StreetViewProvider<C> {
    async fn get_metadata(&self, pano_id: &str) -> Result<PanoramaMetadata, ProviderError> {
        let body = self.http_client.get(&Self::metadata_url(pano_id)).await?;
        parse_metadata(pano_id, &body)
    }
}

/// Walks a chain of array indices into a JSON value.
fn pointer<'a>(value: &'a Value, path: &[usize]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, &i| v.get(i))
}

fn decode_json(body: &[u8]) -> Result<Value, ProviderError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Invalid UTF-8: {}", e)))?;
    let text = text.trim_start();
    let text = text.strip_prefix(XSSI_PREFIX).unwrap_or(text);
    serde_json::from_str(text)
        .map_err(|e| ProviderError::InvalidResponse(format!("Invalid JSON: {}", e)))
}

/// Parses a coverage tile response.
///
/// Entries whose id or position cannot be read are dropped. A tile with no
/// panoramas has no entry list at all and yields an empty vector.
pub(crate) fn parse_coverage(body: &[u8]) -> Result<Vec<PanoramaRef>, ProviderError> {
    let root = decode_json(body)?;
    let Some(entries) = pointer(&root, &[1, 1]).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let id = pointer(entry, &[0, 1])?.as_str()?;
            let lat = pointer(entry, &[2, 0, 2])?.as_f64()?;
            let lon = pointer(entry, &[2, 0, 3])?.as_f64()?;
            Some(PanoramaRef::new(id, lat, lon))
        })
        .collect())
}

/// Parses a metadata response.
pub(crate) fn parse_metadata(pano_id: &str, body: &[u8]) -> Result<PanoramaMetadata, ProviderError> {
    let root = decode_json(body)?;
    if !root.is_array() {
        return Err(ProviderError::InvalidResponse(format!(
            "metadata for {} has no root array",
            pano_id
        )));
    }

    // Unknown ids come back as a bare status array without a record
    let Some(record) = pointer(&root, &[1, 0]).filter(|r| r.is_array()) else {
        return Err(ProviderError::NotFound(pano_id.to_string()));
    };

    let neighbours = pointer(record, &[5, 0, 3, 0])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let neighbour_id = |index: usize| -> Option<String> {
        neighbours
            .get(index)
            .and_then(|n| pointer(n, &[0, 1]))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let available_sizes = pointer(record, &[2, 3, 0])
        .and_then(Value::as_array)
        .map(|sizes| sizes.iter().filter_map(parse_size_entry).collect())
        .unwrap_or_default();

    let tile_size = pointer(record, &[2, 3, 1]).and_then(|t| {
        Some(ImageSize {
            width: t.get(0)?.as_u64()? as u32,
            height: t.get(1)?.as_u64()? as u32,
        })
    });

    let links = pointer(record, &[5, 0, 6])
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .filter_map(|link| {
                    let index = link.get(0)?.as_u64()? as usize;
                    let neighbour = neighbours.get(index)?;
                    Some(PanoramaLink {
                        target_id: neighbour_id(index)?,
                        bearing: pointer(link, &[1, 3]).and_then(Value::as_f64),
                        description: pointer(neighbour, &[3, 2, 0, 0])
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let history = pointer(record, &[5, 0, 8])
        .and_then(Value::as_array)
        .map(|dates| {
            dates
                .iter()
                .filter_map(|entry| {
                    let index = entry.get(0)?.as_u64()? as usize;
                    Some(HistoryEntry {
                        id: neighbour_id(index)?,
                        date: entry.get(1).and_then(format_date),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(PanoramaMetadata {
        source: pointer(record, &[6, 5, 2])
            .and_then(Value::as_str)
            .map(str::to_string),
        capture_date: pointer(record, &[6, 7]).and_then(format_date),
        copyright: pointer(record, &[4, 0, 0, 0, 0])
            .and_then(Value::as_str)
            .map(str::to_string),
        heading: pointer(record, &[5, 0, 1, 2, 0]).and_then(Value::as_f64),
        pitch: pointer(record, &[5, 0, 1, 2, 1]).and_then(Value::as_f64),
        tile_size,
        available_sizes,
        history,
        links,
    })
}

/// Size entries are `[[height, width], ...]`.
fn parse_size_entry(entry: &Value) -> Option<ImageSize> {
    let dims = entry.get(0)?;
    Some(ImageSize {
        width: dims.get(1)?.as_u64()? as u32,
        height: dims.get(0)?.as_u64()? as u32,
    })
}

/// Formats a `[year, month]` or `[year, month, day]` array.
fn format_date(value: &Value) -> Option<String> {
    let year = value.get(0)?.as_u64()?;
    let month = value.get(1)?.as_u64()?;
    match value.get(2).and_then(Value::as_u64) {
        Some(day) => Some(format!("{:04}-{:02}-{:02}", year, month, day)),
        None => Some(format!("{:04}-{:02}", year, month)),
    }
}
