//! Crawl configuration.

use super::defaults::{
    default_indoor_sources, DEFAULT_CACHE_DIR, DEFAULT_OUTPUT_FILE, DEFAULT_PROCESS_CONCURRENCY,
};
use super::{AssemblyConfig, ScanConfig};
use std::path::{Path, PathBuf};

/// Configuration for a full crawl.
///
/// Groups the scan and assembly settings with the process-phase limit, the
/// on-disk locations and the indoor skip list.
///
/// # Example
///
/// ```
/// use panocrawl::config::{CrawlConfig, ScanConfig};
///
/// let config = CrawlConfig::new()
///     .with_scan(ScanConfig::new().with_concurrency(10))
///     .with_process_concurrency(4)
///     .with_output("out/panoramas.jsonl");
/// assert_eq!(config.scan().concurrency(), 10);
/// assert_eq!(config.process_concurrency(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    scan: ScanConfig,
    assembly: AssemblyConfig,
    /// Panoramas processed concurrently
    process_concurrency: usize,
    /// Root of the per-area ledger directories
    cache_dir: PathBuf,
    /// Output JSONL file
    output: PathBuf,
    /// Upload sources skipped before assembly
    indoor_sources: Vec<String>,
}

impl CrawlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_assembly(mut self, assembly: AssemblyConfig) -> Self {
        self.assembly = assembly;
        self
    }

    /// Set the number of panoramas processed concurrently (minimum 1).
    pub fn with_process_concurrency(mut self, concurrency: usize) -> Self {
        self.process_concurrency = concurrency.max(1);
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Replace the indoor skip list. An empty list disables skipping.
    pub fn with_indoor_sources(mut self, sources: Vec<String>) -> Self {
        self.indoor_sources = sources;
        self
    }

    pub fn scan(&self) -> &ScanConfig {
        &self.scan
    }

    pub fn assembly(&self) -> &AssemblyConfig {
        &self.assembly
    }

    pub fn process_concurrency(&self) -> usize {
        self.process_concurrency
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn indoor_sources(&self) -> &[String] {
        &self.indoor_sources
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            assembly: AssemblyConfig::default(),
            process_concurrency: DEFAULT_PROCESS_CONCURRENCY,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            indoor_sources: default_indoor_sources(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrawlConfig::default();
        assert_eq!(config.process_concurrency(), 50);
        assert_eq!(config.scan().concurrency(), 100);
        assert_eq!(config.output(), Path::new("panoramas.jsonl"));
        assert_eq!(config.indoor_sources(), ["innerspace", "cultural_institute"]);
    }

    #[test]
    fn test_with_process_concurrency_minimum() {
        let config = CrawlConfig::new().with_process_concurrency(0);
        assert_eq!(config.process_concurrency(), 1);
    }

    #[test]
    fn test_with_indoor_sources() {
        let config = CrawlConfig::new().with_indoor_sources(vec![]);
        assert!(config.indoor_sources().is_empty());
    }
}
