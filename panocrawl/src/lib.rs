//! panocrawl - street-level panorama crawler
//!
//! Finds every panorama inside a GeoJSON area, rebuilds each one from its
//! tile pyramid, runs visual detection on it and appends the results to a
//! JSONL file. Progress is recorded in a per-area ledger so an interrupted
//! crawl resumes where it stopped.
//!
//! # High-Level API
//!
//! ```ignore
//! use panocrawl::area::GeoArea;
//! use panocrawl::config::ConfigFile;
//! use panocrawl::crawl::CrawlOrchestrator;
//! use panocrawl::detect::HttpDetector;
//! use panocrawl::provider::{AsyncReqwestClient, StreetViewProvider};
//!
//! let config = ConfigFile::load()?;
//! let area = GeoArea::load(Path::new("area.geojson"))?;
//! let provider = Arc::new(StreetViewProvider::new(AsyncReqwestClient::new()?));
//! let detector = Arc::new(HttpDetector::new(AsyncReqwestClient::new()?, endpoint));
//!
//! let report = CrawlOrchestrator::new(provider, detector, config.crawl_config())
//!     .run(&area)
//!     .await?;
//! ```

pub mod area;
pub mod concurrency;
pub mod config;
pub mod coord;
pub mod coverage;
pub mod crawl;
pub mod detect;
pub mod ledger;
pub mod logging;
pub mod panorama;
pub mod provider;
pub mod sink;

/// Version of the panocrawl library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
