//! Common types and utilities shared across CLI commands.

use clap::Args;
use panocrawl::config::ConfigFile;
use std::path::PathBuf;

/// Crawl settings that can be overridden on the command line.
///
/// Flags take precedence over `config.ini`.
#[derive(Debug, Clone, Default, Args)]
pub struct CrawlOverrides {
    /// Directory holding the per-area ledgers
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Concurrent coverage-tile queries
    #[arg(long)]
    pub coverage_concurrency: Option<usize>,
}

impl CrawlOverrides {
    /// Apply the flags that were given to a loaded configuration.
    pub fn apply(&self, config: &mut ConfigFile) {
        if let Some(dir) = &self.cache_dir {
            config.crawl.cache_dir = dir.clone();
        }
        if let Some(n) = self.coverage_concurrency {
            config.crawl.coverage_concurrency = n;
        }
    }
}

/// Shorten an area digest for display.
pub fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let mut config = ConfigFile::default();
        let overrides = CrawlOverrides {
            cache_dir: Some(PathBuf::from("/tmp/ledgers")),
            coverage_concurrency: Some(10),
        };

        overrides.apply(&mut config);

        assert_eq!(config.crawl.cache_dir, PathBuf::from("/tmp/ledgers"));
        assert_eq!(config.crawl.coverage_concurrency, 10);
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = ConfigFile::default();
        CrawlOverrides::default().apply(&mut config);
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_short_digest() {
        assert_eq!(short_digest("abcdef0123456789"), "abcdef012345");
        assert_eq!(short_digest("abc"), "abc");
    }
}
