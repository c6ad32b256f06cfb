//! Run command - full crawl over an area.

use super::common::{short_digest, CrawlOverrides};
use crate::error::CliError;
use crate::runner::CliRunner;
use panocrawl::crawl::CrawlOrchestrator;
use panocrawl::detect::HttpDetector;
use panocrawl::provider::StreetViewProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Arguments for the run command.
pub struct RunArgs {
    pub geojson: PathBuf,
    pub overrides: CrawlOverrides,
    pub output: Option<PathBuf>,
    pub process_concurrency: Option<usize>,
    pub tile_concurrency: Option<usize>,
    pub endpoint: Option<String>,
    pub verbose: bool,
    pub debug: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(args.verbose, args.debug)?;
    runner.log_startup("run");

    let config = runner.config_mut();
    args.overrides.apply(config);
    if let Some(output) = args.output {
        config.crawl.output = output;
    }
    if let Some(n) = args.process_concurrency {
        config.crawl.process_concurrency = n;
    }
    if let Some(n) = args.tile_concurrency {
        config.panorama.tile_concurrency = n;
    }
    if let Some(endpoint) = args.endpoint {
        config.detector.endpoint = Some(endpoint);
    }

    let endpoint = runner.config().detector.endpoint.clone().ok_or_else(|| {
        CliError::Config(
            "No detector endpoint configured. \
             Set endpoint in the [detector] section of config.ini or use --endpoint"
                .to_string(),
        )
    })?;

    let area = runner.load_area(&args.geojson)?;
    let settings = runner.config();
    let crawl_config = settings.crawl_config();

    let provider = Arc::new(StreetViewProvider::new(runner.provider_client()?));
    let detector = Arc::new(
        HttpDetector::new(runner.detector_client()?, endpoint.as_str())
            .with_min_distance(settings.detector.min_distance)
            .with_threshold(settings.detector.threshold),
    );

    println!("--- panocrawl ---");
    println!("Area digest: {}...", short_digest(area.digest()));
    println!("Output:      {}", crawl_config.output().display());
    println!("Detector:    {}", endpoint);
    println!();

    let orchestrator = CrawlOrchestrator::new(provider, detector, crawl_config);
    let runtime = runner.runtime()?;
    let report = runtime.block_on(orchestrator.run(&area))?;

    info!(succeeded = report.succeeded, failed = report.failed, "Run finished");

    println!("--- Report ---");
    println!("{}", report);
    if report.pending == 0 {
        println!();
        println!("No new panoramas to process. All done!");
    } else if !report.is_clean() {
        println!();
        println!("Failed panoramas will be retried on the next run.");
    }

    Ok(())
}
