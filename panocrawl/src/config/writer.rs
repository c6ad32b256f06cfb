//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let endpoint = config.detector.endpoint.as_deref().unwrap_or("");
    let user_agent = config.download.user_agent.as_deref().unwrap_or("");

    format!(
        r#"[crawl]
; Concurrent coverage-tile queries during the scan phase (default: 100)
coverage_concurrency = {}
; Panoramas processed concurrently (default: 50)
process_concurrency = {}
; Directory holding one ledger per area, keyed by the area digest
cache_dir = {}
; Append-only JSONL file receiving one record per completed panorama
output = {}
; Comma-separated upload sources skipped as indoor captures
indoor_sources = {}

[panorama]
; Pyramid level to assemble (0-5; default: 3)
zoom = {}
; Concurrent tile fetches per panorama (default: 50)
tile_concurrency = {}
; Canonical resolution every panorama is resized to
width = {}
height = {}
; Maximum sequential probes while discovering the tile grid
max_probes = {}

[download]
; Per-request timeout in seconds (default: 20)
timeout = {}
; User-Agent override; leave empty for the built-in browser string
user_agent = {}

[detector]
; Inference endpoint receiving JPEG uploads; required for `panocrawl run`
; Example: endpoint = http://localhost:8080/infer
endpoint = {}
; Per-request timeout in seconds (default: 120)
timeout = {}
; Minimum spacing between heatmap peaks, in heatmap pixels
min_distance = {}
; Heatmap values must exceed this to count as a detection (0-1)
threshold = {}

[logging]
; Log file, cleared at the start of each session
file = {}
"#,
        config.crawl.coverage_concurrency,
        config.crawl.process_concurrency,
        path_to_string(&config.crawl.cache_dir),
        path_to_string(&config.crawl.output),
        config.crawl.indoor_sources.join(", "),
        config.panorama.zoom,
        config.panorama.tile_concurrency,
        config.panorama.width,
        config.panorama.height,
        config.panorama.max_probes,
        config.download.timeout,
        user_agent,
        endpoint,
        config.detector.timeout,
        config.detector.min_distance,
        config.detector.threshold,
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
