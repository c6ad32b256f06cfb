//! Coverage scan configuration.

use super::defaults::DEFAULT_COVERAGE_CONCURRENCY;

/// Configuration for the coverage scan phase.
///
/// # Example
///
/// ```
/// use panocrawl::config::ScanConfig;
///
/// let config = ScanConfig::new().with_concurrency(20);
/// assert_eq!(config.concurrency(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Maximum coverage queries in flight
    concurrency: usize,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of concurrent coverage queries (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_COVERAGE_CONCURRENCY,
        }
    }
}
