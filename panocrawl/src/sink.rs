//! Append-only JSONL output of completed panoramas.
//!
//! Each line is one self-contained [`OutputRecord`]. A record is flushed and
//! synced before [`ResultSink::append`] returns, so the ledger entry that
//! follows it never refers to an unwritten record.

use crate::detect::Detection;
use crate::provider::{HistoryEntry, ImageSize, PanoramaLink, PanoramaMetadata, PanoramaRef};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Output file errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open output file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write output file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Panorama description carried in each record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanoramaInfo {
    pub lat: f64,
    pub lng: f64,
    /// Native width in pixels; consumers scale normalized detections by this
    pub width: u32,
    /// Native height in pixels
    pub height: u32,
    pub source: Option<String>,
    pub capture_date: Option<String>,
    pub copyright: Option<String>,
    pub camera_heading: Option<f64>,
    pub camera_pitch: Option<f64>,
    pub tile_size: Option<ImageSize>,
    pub links: Vec<PanoramaLink>,
    pub history: Vec<HistoryEntry>,
}

/// One completed panorama.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub panorama_id: String,
    pub pano: PanoramaInfo,
    pub detections: Vec<Detection>,
}

impl OutputRecord {
    /// Builds a record from the coverage entry, its metadata and detections.
    ///
    /// Width and height are the largest size the provider advertises, or
    /// `fallback_size` when it advertises none.
    pub fn new(
        panorama: &PanoramaRef,
        metadata: PanoramaMetadata,
        detections: Vec<Detection>,
        fallback_size: ImageSize,
    ) -> Self {
        let size = metadata.largest_size().unwrap_or(fallback_size);
        Self {
            panorama_id: panorama.id.clone(),
            pano: PanoramaInfo {
                lat: panorama.lat,
                lng: panorama.lon,
                width: size.width,
                height: size.height,
                source: metadata.source,
                capture_date: metadata.capture_date,
                copyright: metadata.copyright,
                camera_heading: metadata.heading,
                camera_pitch: metadata.pitch,
                tile_size: metadata.tile_size,
                links: metadata.links,
                history: metadata.history,
            },
            detections,
        }
    }
}

/// Append-only newline-delimited JSON writer.
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultSink {
    /// Opens the output file for appending, creating it and its parent
    /// directory if needed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SinkError::Open {
                    path: path.clone(),
                    source,
                })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "Output file opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one record as a single line and syncs it to disk.
    pub async fn append(&self, record: &OutputRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        let result = async {
            file.write_all(&line).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        result.map_err(|source| SinkError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
