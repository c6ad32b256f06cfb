//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;

// =============================================================================
// [crawl]
// =============================================================================

/// Concurrent coverage-tile queries during the scan phase.
pub const DEFAULT_COVERAGE_CONCURRENCY: usize = 100;

/// Panoramas processed concurrently during the process phase.
pub const DEFAULT_PROCESS_CONCURRENCY: usize = 50;

/// Directory holding one ledger subdirectory per area digest.
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Output JSONL file.
pub const DEFAULT_OUTPUT_FILE: &str = "panoramas.jsonl";

/// Upload sources treated as indoor captures and skipped.
pub const DEFAULT_INDOOR_SOURCES: &[&str] = &["innerspace", "cultural_institute"];

// =============================================================================
// [panorama]
// =============================================================================

/// Pyramid level fetched for assembly.
pub const DEFAULT_PANORAMA_ZOOM: u8 = 3;

/// Concurrent tile fetches per assembly.
pub const DEFAULT_TILE_CONCURRENCY: usize = 50;

/// Canonical output width in pixels.
pub const DEFAULT_PANORAMA_WIDTH: u32 = 4096;

/// Canonical output height in pixels.
pub const DEFAULT_PANORAMA_HEIGHT: u32 = 2048;

/// Upper bound on sequential boundary probes per panorama.
pub const DEFAULT_MAX_PROBES: usize = 64;

/// Seed tile column for boundary discovery.
pub const DEFAULT_SEED_COL: u32 = 4;

/// Seed tile row for boundary discovery.
pub const DEFAULT_SEED_ROW: u32 = 1;

// =============================================================================
// [download]
// =============================================================================

/// Per-request timeout for provider traffic, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = crate::provider::DEFAULT_TIMEOUT_SECS;

// =============================================================================
// [detector]
// =============================================================================

/// Per-request timeout for the inference endpoint, in seconds.
pub const DEFAULT_DETECTOR_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_DETECTOR_MIN_DISTANCE: usize = crate::detect::DEFAULT_MIN_DISTANCE;

pub const DEFAULT_DETECTOR_THRESHOLD: f32 = crate::detect::DEFAULT_THRESHOLD;

// =============================================================================
// [logging]
// =============================================================================

/// Log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "panocrawl.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            crawl: CrawlSettings {
                coverage_concurrency: DEFAULT_COVERAGE_CONCURRENCY,
                process_concurrency: DEFAULT_PROCESS_CONCURRENCY,
                cache_dir: DEFAULT_CACHE_DIR.into(),
                output: DEFAULT_OUTPUT_FILE.into(),
                indoor_sources: default_indoor_sources(),
            },
            panorama: PanoramaSettings {
                zoom: DEFAULT_PANORAMA_ZOOM,
                tile_concurrency: DEFAULT_TILE_CONCURRENCY,
                width: DEFAULT_PANORAMA_WIDTH,
                height: DEFAULT_PANORAMA_HEIGHT,
                max_probes: DEFAULT_MAX_PROBES,
            },
            download: DownloadSettings {
                timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
                user_agent: None,
            },
            detector: DetectorSettings {
                endpoint: None,
                timeout: DEFAULT_DETECTOR_TIMEOUT_SECS,
                min_distance: DEFAULT_DETECTOR_MIN_DISTANCE,
                threshold: DEFAULT_DETECTOR_THRESHOLD,
            },
            logging: LoggingSettings {
                file: config_directory().join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}

/// Default indoor source tags as owned strings.
pub fn default_indoor_sources() -> Vec<String> {
    DEFAULT_INDOOR_SOURCES.iter().map(|s| s.to_string()).collect()
}
