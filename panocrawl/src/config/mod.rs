//! Configuration for panocrawl components.
//!
//! Two layers:
//!
//! - [`ConfigFile`]: the user's `~/.panocrawl/config.ini`, one settings
//!   struct per INI section
//! - Component configs ([`ScanConfig`], [`AssemblyConfig`], [`CrawlConfig`])
//!   consumed by the library, built from a `ConfigFile` or directly with
//!   `with_*` setters
//!
//! # Example
//!
//! ```
//! use panocrawl::config::{AssemblyConfig, CrawlConfig};
//!
//! let config = CrawlConfig::new()
//!     .with_assembly(AssemblyConfig::new().with_tile_concurrency(16))
//!     .with_process_concurrency(8);
//! ```

mod assembly;
mod crawl;
mod defaults;
mod file;
mod parser;
mod scan;
mod settings;
mod writer;

pub use assembly::AssemblyConfig;
pub use crawl::CrawlConfig;
pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use scan::ScanConfig;
pub use settings::{
    ConfigFile, CrawlSettings, DetectorSettings, DownloadSettings, LoggingSettings,
    PanoramaSettings,
};
