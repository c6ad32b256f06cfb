//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [crawl] section
    if let Some(section) = ini.section(Some("crawl")) {
        if let Some(v) = section.get("coverage_concurrency") {
            config.crawl.coverage_concurrency =
                parse_positive("crawl", "coverage_concurrency", v)?;
        }
        if let Some(v) = section.get("process_concurrency") {
            config.crawl.process_concurrency = parse_positive("crawl", "process_concurrency", v)?;
        }
        if let Some(v) = section.get("cache_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.crawl.cache_dir = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("output") {
            let v = v.trim();
            if !v.is_empty() {
                config.crawl.output = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("indoor_sources") {
            config.crawl.indoor_sources = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    // [panorama] section
    if let Some(section) = ini.section(Some("panorama")) {
        if let Some(v) = section.get("zoom") {
            let zoom: u8 = parse_value("panorama", "zoom", v, "must be an integer 0-5")?;
            if zoom > 5 {
                return Err(invalid("panorama", "zoom", v, "must be an integer 0-5"));
            }
            config.panorama.zoom = zoom;
        }
        if let Some(v) = section.get("tile_concurrency") {
            config.panorama.tile_concurrency = parse_positive("panorama", "tile_concurrency", v)?;
        }
        if let Some(v) = section.get("width") {
            config.panorama.width = parse_positive("panorama", "width", v)?;
        }
        if let Some(v) = section.get("height") {
            config.panorama.height = parse_positive("panorama", "height", v)?;
        }
        if let Some(v) = section.get("max_probes") {
            config.panorama.max_probes = parse_positive("panorama", "max_probes", v)?;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("timeout") {
            config.download.timeout = parse_positive("download", "timeout", v)?;
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            config.download.user_agent = (!v.is_empty()).then(|| v.to_string());
        }
    }

    // [detector] section
    if let Some(section) = ini.section(Some("detector")) {
        if let Some(v) = section.get("endpoint") {
            let v = v.trim();
            if !v.is_empty() && !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid(
                    "detector",
                    "endpoint",
                    v,
                    "must be an http:// or https:// URL",
                ));
            }
            config.detector.endpoint = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = section.get("timeout") {
            config.detector.timeout = parse_positive("detector", "timeout", v)?;
        }
        if let Some(v) = section.get("min_distance") {
            config.detector.min_distance = parse_value(
                "detector",
                "min_distance",
                v,
                "must be a non-negative integer (pixels)",
            )?;
        }
        if let Some(v) = section.get("threshold") {
            let threshold: f32 =
                parse_value("detector", "threshold", v, "must be a number between 0 and 1")?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(invalid(
                    "detector",
                    "threshold",
                    v,
                    "must be a number between 0 and 1",
                ));
            }
            config.detector.threshold = threshold;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

/// Parses an integer that must be at least 1.
fn parse_positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + From<u8>,
{
    let reason = "must be a positive integer";
    let parsed: T = parse_value(section, key, value, reason)?;
    if parsed < T::from(1) {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
