//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Crawl phases, paths and skip rules
    pub crawl: CrawlSettings,
    /// Panorama assembly
    pub panorama: PanoramaSettings,
    /// Provider HTTP settings
    pub download: DownloadSettings,
    /// Inference endpoint
    pub detector: DetectorSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Crawl configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    /// Concurrent coverage queries
    pub coverage_concurrency: usize,
    /// Concurrent panoramas in the process phase
    pub process_concurrency: usize,
    /// Root of the per-area ledger directories
    pub cache_dir: PathBuf,
    /// Output JSONL file
    pub output: PathBuf,
    /// Source tags skipped as indoor captures
    pub indoor_sources: Vec<String>,
}

/// Panorama assembly configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaSettings {
    /// Pyramid level
    pub zoom: u8,
    /// Concurrent tile fetches per assembly
    pub tile_concurrency: usize,
    /// Canonical width in pixels
    pub width: u32,
    /// Canonical height in pixels
    pub height: u32,
    /// Boundary probe budget
    pub max_probes: usize,
}

/// Download configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    /// Timeout in seconds for HTTP requests.
    pub timeout: u64,
    /// User-Agent override; `None` uses the built-in browser string
    pub user_agent: Option<String>,
}

/// Detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    /// Inference URL; `None` means no detector is configured
    pub endpoint: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Minimum spacing between heatmap peaks, in heatmap pixels
    pub min_distance: usize,
    /// Heatmap peak threshold
    pub threshold: f32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
