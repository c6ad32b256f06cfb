//! panocrawl CLI - Command-line interface
//!
//! Crawls street-level panoramas inside a GeoJSON area, runs detection on
//! each one and appends the results to a JSONL file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use commands::common::CrawlOverrides;
use commands::config::ConfigCommands;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "panocrawl")]
#[command(version = panocrawl::VERSION)]
#[command(about = "Find, assemble and analyse street-level panoramas inside an area", long_about = None)]
struct Cli {
    /// Mirror log output to stdout
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Enable debug-level logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl an area: scan coverage, then assemble and analyse every new panorama
    Run {
        /// GeoJSON file defining the area of interest
        geojson: PathBuf,

        #[command(flatten)]
        overrides: CrawlOverrides,

        /// Output JSONL file (default from config)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Panoramas processed concurrently
        #[arg(long)]
        process_concurrency: Option<usize>,

        /// Tile fetches in flight per panorama
        #[arg(long)]
        tile_concurrency: Option<usize>,

        /// Detection endpoint URL (overrides config)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// List panoramas inside an area and report how many are still pending
    Scan {
        /// GeoJSON file defining the area of interest
        geojson: PathBuf,

        #[command(flatten)]
        overrides: CrawlOverrides,

        /// Print every panorama id with its position
        #[arg(long)]
        list: bool,
    },

    /// Assemble a single panorama and save it as JPEG
    Assemble {
        /// Panorama id
        pano_id: String,

        /// Output JPEG file
        #[arg(long, short)]
        output: PathBuf,

        /// Pyramid level (0-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
        zoom: Option<u8>,

        /// Output width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Output height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let (verbose, debug) = (cli.verbose, cli.debug);

    let result = match cli.command {
        Commands::Run {
            geojson,
            overrides,
            output,
            process_concurrency,
            tile_concurrency,
            endpoint,
        } => commands::run::run(commands::run::RunArgs {
            geojson,
            overrides,
            output,
            process_concurrency,
            tile_concurrency,
            endpoint,
            verbose,
            debug,
        }),
        Commands::Scan {
            geojson,
            overrides,
            list,
        } => commands::scan::run(commands::scan::ScanArgs {
            geojson,
            overrides,
            list,
            verbose,
            debug,
        }),
        Commands::Assemble {
            pano_id,
            output,
            zoom,
            width,
            height,
        } => commands::assemble::run(commands::assemble::AssembleArgs {
            pano_id,
            output,
            zoom,
            width,
            height,
            verbose,
            debug,
        }),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "panocrawl",
            "run",
            "area.geojson",
            "--cache-dir",
            "ledgers",
            "--process-concurrency",
            "8",
            "--endpoint",
            "http://localhost:8080/infer",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                geojson,
                overrides,
                process_concurrency,
                endpoint,
                ..
            } => {
                assert_eq!(geojson, PathBuf::from("area.geojson"));
                assert_eq!(overrides.cache_dir, Some(PathBuf::from("ledgers")));
                assert_eq!(process_concurrency, Some(8));
                assert_eq!(endpoint.as_deref(), Some("http://localhost:8080/infer"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_assemble_requires_output() {
        assert!(Cli::try_parse_from(["panocrawl", "assemble", "PANO"]).is_err());

        let cli =
            Cli::try_parse_from(["panocrawl", "assemble", "PANO", "-o", "pano.jpg", "--debug"])
                .unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Assemble { .. }));
    }

    #[test]
    fn test_zoom_range() {
        assert!(
            Cli::try_parse_from(["panocrawl", "assemble", "P", "-o", "p.jpg", "--zoom", "7"])
                .is_err()
        );
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["panocrawl", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Init { force: true }
            }
        ));
    }
}
