//! Scan command - coverage phase only.
//!
//! Lists the panoramas inside an area and compares them with the area's
//! ledger. Nothing is processed and nothing is written.

use super::common::{short_digest, CrawlOverrides};
use crate::error::CliError;
use crate::runner::CliRunner;
use panocrawl::crawl::survey;
use panocrawl::provider::StreetViewProvider;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the scan command.
pub struct ScanArgs {
    pub geojson: PathBuf,
    pub overrides: CrawlOverrides,
    /// Print every panorama id found
    pub list: bool,
    pub verbose: bool,
    pub debug: bool,
}

/// Run the scan command.
pub fn run(args: ScanArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(args.verbose, args.debug)?;
    runner.log_startup("scan");
    args.overrides.apply(runner.config_mut());

    let area = runner.load_area(&args.geojson)?;
    let config = runner.config().crawl_config();
    let provider = Arc::new(StreetViewProvider::new(runner.provider_client()?));

    println!("Area digest: {}...", short_digest(area.digest()));
    println!(
        "Scanning {} coverage tiles ({} concurrent)...",
        area.tile_rect().len(),
        config.scan().concurrency()
    );

    let runtime = runner.runtime()?;
    let (scan, report) = runtime.block_on(survey(provider, &config, &area))?;

    println!();
    println!("Coverage tiles failed:    {}", scan.tiles_failed());
    println!("Panoramas found in area:  {}", report.found);
    println!("Already processed:        {}", report.already_processed);
    println!("Pending:                  {}", report.pending);

    if args.list {
        println!();
        for panorama in scan.panoramas() {
            println!("{}\t{:.7}\t{:.7}", panorama.id, panorama.lat, panorama.lon);
        }
    }

    Ok(())
}
