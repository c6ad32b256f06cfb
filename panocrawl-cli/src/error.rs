//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use panocrawl::area::AreaError;
use panocrawl::config::ConfigFileError;
use panocrawl::crawl::CrawlError;
use panocrawl::panorama::AssemblyError;
use panocrawl::provider::ProviderError;
use std::fmt;
use std::path::PathBuf;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Input GeoJSON file does not exist
    InputNotFound(PathBuf),
    /// Input GeoJSON could not be used
    Area(AreaError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to create an HTTP client
    Client(ProviderError),
    /// Crawl could not start
    Crawl(CrawlError),
    /// Single panorama assembly failed
    Assembly(AssemblyError),
    /// Failed to write output file
    FileWrite { path: PathBuf, error: String },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check your configuration with: panocrawl config path");
            }
            CliError::Assembly(AssemblyError::NotFound(_)) => {
                eprintln!();
                eprintln!("The panorama id may be wrong, or the panorama has been removed.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InputNotFound(path) => {
                write!(f, "The file '{}' was not found", path.display())
            }
            CliError::Area(e) => write!(f, "Invalid area: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Crawl(e) => write!(f, "Crawl failed: {}", e),
            CliError::Assembly(e) => write!(f, "Assembly failed: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Area(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Crawl(e) => Some(e),
            CliError::Assembly(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<AreaError> for CliError {
    fn from(e: AreaError) -> Self {
        match e {
            AreaError::InputNotFound(path) => CliError::InputNotFound(path),
            other => CliError::Area(other),
        }
    }
}

impl From<CrawlError> for CliError {
    fn from(e: CrawlError) -> Self {
        CliError::Crawl(e)
    }
}

impl From<AssemblyError> for CliError {
    fn from(e: AssemblyError) -> Self {
        CliError::Assembly(e)
    }
}
