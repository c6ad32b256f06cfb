//! CLI runner for common setup and operations.
//!
//! Encapsulates logging initialization, config loading, runtime and client
//! creation to reduce duplication across command handlers.

use crate::error::CliError;
use panocrawl::area::GeoArea;
use panocrawl::config::{ConfigFile, DEFAULT_LOG_FILE_NAME};
use panocrawl::logging::{init_logging_full, LoggingGuard};
use panocrawl::provider::{AsyncReqwestClient, DEFAULT_USER_AGENT};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Mirror log events to stdout
    /// * `debug_mode` - Enable debug-level logging when RUST_LOG is unset
    pub fn new(verbose: bool, debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE_NAME.to_string());

        let logging_guard = init_logging_full(&log_dir, &log_file, verbose, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Get the configuration for command-line overrides.
    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("panocrawl v{}", panocrawl::VERSION);
        info!("panocrawl CLI: {} command", command);
    }

    /// Build the multi-threaded runtime that drives a command.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }

    /// HTTP client for provider traffic, per the `[download]` settings.
    pub fn provider_client(&self) -> Result<AsyncReqwestClient, CliError> {
        let download = &self.config.download;
        let user_agent = download.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        AsyncReqwestClient::with_options(download.timeout, user_agent).map_err(CliError::Client)
    }

    /// HTTP client for the inference endpoint, per the `[detector]` settings.
    pub fn detector_client(&self) -> Result<AsyncReqwestClient, CliError> {
        let user_agent = format!("panocrawl/{}", panocrawl::VERSION);
        AsyncReqwestClient::with_options(self.config.detector.timeout, &user_agent)
            .map_err(CliError::Client)
    }

    /// Load the input area and log its identity.
    pub fn load_area(&self, path: &Path) -> Result<GeoArea, CliError> {
        info!(path = %path.display(), "Loading area");
        let area = GeoArea::load(path)?;
        let rect = area.tile_rect();
        info!(
            digest = area.digest(),
            tiles = rect.len(),
            "Area loaded"
        );
        Ok(area)
    }
}
