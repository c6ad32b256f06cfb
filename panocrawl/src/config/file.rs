//! Configuration file handling for ~/.panocrawl/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;
use super::{AssemblyConfig, CrawlConfig, ScanConfig};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.panocrawl/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// Coverage scan settings.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new().with_concurrency(self.crawl.coverage_concurrency)
    }

    /// Panorama assembly settings.
    pub fn assembly_config(&self) -> AssemblyConfig {
        let panorama = &self.panorama;
        AssemblyConfig::new()
            .with_zoom(panorama.zoom)
            .with_tile_concurrency(panorama.tile_concurrency)
            .with_width(panorama.width)
            .with_height(panorama.height)
            .with_max_probes(panorama.max_probes)
    }

    /// Full crawl settings.
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig::new()
            .with_scan(self.scan_config())
            .with_assembly(self.assembly_config())
            .with_process_concurrency(self.crawl.process_concurrency)
            .with_cache_dir(self.crawl.cache_dir.clone())
            .with_output(self.crawl.output.clone())
            .with_indoor_sources(self.crawl.indoor_sources.clone())
    }
}

/// Get the path to the config directory (~/.panocrawl).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".panocrawl")
}

/// Get the path to the config file (~/.panocrawl/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
