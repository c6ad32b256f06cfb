//! Provider types and traits

use crate::coord::CoverageTile;
use serde::Serialize;
use std::future::Future;
use thiserror::Error;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// Invalid response data from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The provider has no record of the panorama
    #[error("Panorama {0} not found")]
    NotFound(String),
}

/// A panorama reported by the coverage listing.
///
/// Identity is the `id`; coordinates are carried along for the output record.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaRef {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

impl PanoramaRef {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
        }
    }
}

/// Pixel dimensions of an image or tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// An earlier capture at the same location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub date: Option<String>,
}

/// A navigation link to a neighbouring panorama.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanoramaLink {
    pub target_id: String,
    pub bearing: Option<f64>,
    pub description: Option<String>,
}

/// Capture metadata for one panorama.
///
/// Every field is optional on the wire; missing values are left empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanoramaMetadata {
    /// Upload source tag (e.g. `launch`, `innerspace`)
    pub source: Option<String>,
    pub capture_date: Option<String>,
    pub copyright: Option<String>,
    /// Camera heading in degrees
    pub heading: Option<f64>,
    /// Camera pitch in degrees
    pub pitch: Option<f64>,
    pub tile_size: Option<ImageSize>,
    /// Available full-image sizes, smallest first
    pub available_sizes: Vec<ImageSize>,
    pub history: Vec<HistoryEntry>,
    pub links: Vec<PanoramaLink>,
}

impl PanoramaMetadata {
    /// Largest full-image size the provider advertises.
    pub fn largest_size(&self) -> Option<ImageSize> {
        self.available_sizes
            .iter()
            .copied()
            .max_by_key(|s| s.width as u64 * s.height as u64)
    }

    /// Returns true if the source tag is in the given set.
    pub fn is_from_source(&self, sources: &[String]) -> bool {
        self.source
            .as_deref()
            .is_some_and(|s| sources.iter().any(|candidate| candidate == s))
    }
}

/// Lists panoramas whose position falls inside a coverage tile.
pub trait CoverageSource: Send + Sync {
    /// Lists panoramas in a single coverage tile.
    fn list_panoramas(
        &self,
        tile: CoverageTile,
    ) -> impl Future<Output = Result<Vec<PanoramaRef>, ProviderError>> + Send;
}

/// Fetches raw tiles of a panorama's image pyramid.
pub trait TileSource: Send + Sync {
    /// Downloads one encoded tile.
    ///
    /// # Arguments
    ///
    /// * `pano_id` - Panorama identifier
    /// * `col` - Tile column within the pyramid level
    /// * `row` - Tile row within the pyramid level
    /// * `zoom` - Pyramid level; selects tile pixel size
    ///
    /// # Returns
    ///
    /// Raw image data (typically JPEG) or an error.
    fn fetch_tile(
        &self,
        pano_id: &str,
        col: u32,
        row: u32,
        zoom: u8,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Fetches capture metadata for a panorama.
pub trait MetadataSource: Send + Sync {
    fn get_metadata(
        &self,
        pano_id: &str,
    ) -> impl Future<Output = Result<PanoramaMetadata, ProviderError>> + Send;
}
