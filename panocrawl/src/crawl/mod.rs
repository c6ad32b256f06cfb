//! Crawl orchestration.
//!
//! A crawl runs in two phases, each with its own concurrency limit:
//!
//! 1. **Scan**: list every panorama inside the area ([`CoverageScanner`]).
//!    The phase completes before any processing starts, because the work set
//!    is the scan result minus the ledger.
//! 2. **Process**: for each pending id, look up metadata, skip indoor
//!    captures, assemble, detect, write the output record and only then
//!    append the id to the ledger.
//!
//! A failure for one id is logged and tallied; it never stops the crawl.
//! Because the ledger entry is written after the output record, a crash
//! between the two leads to the id being processed again, never to a
//! missing record.

mod report;

pub use report::{CrawlReport, FailureKind};

use crate::area::GeoArea;
use crate::concurrency::{run_bounded, ConcurrencyLimiter};
use crate::config::CrawlConfig;
use crate::coverage::{CoverageScan, CoverageScanner};
use crate::detect::{DetectionError, Detector};
use crate::ledger::{self, LedgerError, ProcessingLedger};
use crate::panorama::{AssemblyError, PanoramaAssembler};
use crate::provider::{
    CoverageSource, ImageSize, MetadataSource, PanoramaRef, ProviderError, TileSource,
};
use crate::sink::{OutputRecord, ResultSink, SinkError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a crawl before processing starts.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Output(#[from] SinkError),
}

/// Failure while processing one panorama.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("metadata lookup failed: {0}")]
    Metadata(#[source] ProviderError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Output(#[from] SinkError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("processing task aborted: {0}")]
    Panic(String),
}

impl ItemError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ItemError::Metadata(_) => FailureKind::Metadata,
            ItemError::Assembly(AssemblyError::NotFound(_)) => FailureKind::NotFound,
            ItemError::Assembly(AssemblyError::Empty(_)) => FailureKind::Empty,
            ItemError::Assembly(AssemblyError::Reconstruct { .. }) => FailureKind::Reconstruct,
            ItemError::Detection(_) => FailureKind::Detection,
            ItemError::Output(_) => FailureKind::Output,
            ItemError::Ledger(_) => FailureKind::Ledger,
            ItemError::Panic(_) => FailureKind::Panic,
        }
    }
}

/// Final state of one successfully handled panorama.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Record written and id appended to the ledger
    Completed { detections: usize },
    /// Indoor capture; nothing written
    Skipped { source: String },
}

/// Scans an area and compares it with its ledger without writing anything.
///
/// Fills `found`, `already_processed` and `pending`.
pub async fn survey<P>(
    provider: Arc<P>,
    config: &CrawlConfig,
    area: &GeoArea,
) -> Result<(CoverageScan, CrawlReport), CrawlError>
where
    P: CoverageSource + 'static,
{
    let completed = ledger::read_completed(config.cache_dir(), area.digest()).await?;
    let scan = CoverageScanner::new(provider, *config.scan()).scan(area).await;

    let found = scan.len();
    let pending = scan.ids().filter(|id| !completed.contains(*id)).count();
    let report = CrawlReport {
        found,
        already_processed: found - pending,
        pending,
        ..Default::default()
    };
    Ok((scan, report))
}

/// Per-item pipeline shared by every processing task.
struct Pipeline<P: TileSource, D> {
    provider: Arc<P>,
    assembler: PanoramaAssembler<P>,
    detector: Arc<D>,
    ledger: ProcessingLedger,
    sink: ResultSink,
    indoor_sources: Vec<String>,
    canonical_size: ImageSize,
}

impl<P, D> Pipeline<P, D>
where
    P: MetadataSource + TileSource + 'static,
    D: Detector,
{
    async fn process(&self, panorama: &PanoramaRef) -> Result<ItemOutcome, ItemError> {
        let id = panorama.id.as_str();

        let metadata = self
            .provider
            .get_metadata(id)
            .await
            .map_err(ItemError::Metadata)?;
        if metadata.is_from_source(&self.indoor_sources) {
            let source = metadata.source.unwrap_or_default();
            debug!(pano_id = id, source = %source, "Skipping indoor panorama");
            return Ok(ItemOutcome::Skipped { source });
        }

        let assembled = self.assembler.assemble(id).await?;
        let detections = self.detector.detect(Arc::new(assembled.image)).await?;
        let count = detections.len();

        let record = OutputRecord::new(panorama, metadata, detections, self.canonical_size);
        self.sink.append(&record).await?;
        self.ledger.append(id).await?;

        debug!(
            pano_id = id,
            detections = count,
            tiles = assembled.tiles,
            missing_tiles = assembled.missing,
            "Panorama processed"
        );
        Ok(ItemOutcome::Completed { detections: count })
    }
}

/// Drives a full crawl over one area.
///
/// The provider supplies coverage, tiles and metadata; the detector is
/// built once by the caller and shared by every task.
pub struct CrawlOrchestrator<P, D> {
    provider: Arc<P>,
    detector: Arc<D>,
    config: CrawlConfig,
}

impl<P, D> CrawlOrchestrator<P, D>
where
    P: CoverageSource + TileSource + MetadataSource + 'static,
    D: Detector + 'static,
{
    pub fn new(provider: Arc<P>, detector: Arc<D>, config: CrawlConfig) -> Self {
        Self {
            provider,
            detector,
            config,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Runs both phases and returns the tally.
    ///
    /// Only failing to open the ledger or the output file is an error; every
    /// per-panorama failure is counted in the report instead.
    pub async fn run(&self, area: &GeoArea) -> Result<CrawlReport, CrawlError> {
        let config = &self.config;
        let ledger = ProcessingLedger::open(config.cache_dir(), area.digest()).await?;
        let sink = ResultSink::open(config.output()).await?;

        info!(
            area = %short_digest(area.digest()),
            ledger = %ledger.path().display(),
            completed = ledger.len(),
            "Starting crawl"
        );

        // Phase 1
        let scan = CoverageScanner::new(Arc::clone(&self.provider), *config.scan())
            .scan(area)
            .await;
        let pending = ledger.pending(scan.ids());

        let mut report = CrawlReport {
            found: scan.len(),
            already_processed: scan.len() - pending.len(),
            pending: pending.len(),
            ..Default::default()
        };

        info!(
            found = report.found,
            already_processed = report.already_processed,
            pending = report.pending,
            "Coverage phase complete"
        );

        if pending.is_empty() {
            info!("No new panoramas to process");
            return Ok(report);
        }

        // Phase 2
        let work: Vec<PanoramaRef> = pending
            .iter()
            .filter_map(|id| scan.get(id).cloned())
            .collect();
        let pipeline = Arc::new(Pipeline {
            provider: Arc::clone(&self.provider),
            assembler: PanoramaAssembler::new(Arc::clone(&self.provider), *config.assembly()),
            detector: Arc::clone(&self.detector),
            ledger,
            sink,
            indoor_sources: config.indoor_sources().to_vec(),
            canonical_size: config.assembly().canonical_size(),
        });
        let limiter = ConcurrencyLimiter::new(config.process_concurrency(), "process");

        run_bounded(
            &limiter,
            work,
            |panorama| {
                let pipeline = Arc::clone(&pipeline);
                async move {
                    let outcome = pipeline.process(&panorama).await;
                    (panorama.id, outcome)
                }
            },
            |completed| match completed {
                Ok((_, Ok(ItemOutcome::Completed { .. }))) => report.succeeded += 1,
                Ok((_, Ok(ItemOutcome::Skipped { .. }))) => report.skipped += 1,
                Ok((id, Err(e))) => {
                    warn!(
                        pano_id = %id,
                        kind = %e.kind(),
                        error = %e,
                        "Failed to process panorama, will retry next run"
                    );
                    report.record_failure(e.kind());
                }
                Err(e) => {
                    let e = ItemError::Panic(e.to_string());
                    report.record_failure(e.kind());
                }
            },
        )
        .await;

        info!(
            found = report.found,
            skipped = report.skipped,
            succeeded = report.succeeded,
            failed = report.failed,
            peak_in_flight = limiter.peak_in_flight(),
            "Crawl complete"
        );

        Ok(report)
    }
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::CoverageTile;
    use crate::detect::Detection;
    use crate::panorama::testing::GridTiles;
    use crate::provider::PanoramaMetadata;
    use image::RgbImage;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Provider with per-id behaviour: every coverage tile lists every
    /// panorama; `GONE` has no tiles; `BAD_META` has no metadata.
    struct FakeProvider {
        panoramas: Vec<PanoramaRef>,
        sources: HashMap<String, String>,
        tiles: GridTiles,
    }

    impl FakeProvider {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                panoramas: entries
                    .iter()
                    .map(|(id, _)| PanoramaRef::new(*id, 49.28, -123.12))
                    .collect(),
                sources: entries
                    .iter()
                    .map(|(id, source)| (id.to_string(), source.to_string()))
                    .collect(),
                tiles: GridTiles::new(7, 3),
            }
        }
    }

    impl CoverageSource for FakeProvider {
        async fn list_panoramas(
            &self,
            _tile: CoverageTile,
        ) -> Result<Vec<PanoramaRef>, ProviderError> {
            Ok(self.panoramas.clone())
        }
    }

    impl TileSource for FakeProvider {
        async fn fetch_tile(
            &self,
            pano_id: &str,
            col: u32,
            row: u32,
            zoom: u8,
        ) -> Result<Vec<u8>, ProviderError> {
            if pano_id == "GONE" {
                return Err(ProviderError::HttpError("HTTP 400".into()));
            }
            self.tiles.fetch_tile(pano_id, col, row, zoom).await
        }
    }

    impl MetadataSource for FakeProvider {
        async fn get_metadata(&self, pano_id: &str) -> Result<PanoramaMetadata, ProviderError> {
            if pano_id == "BAD_META" {
                return Err(ProviderError::InvalidResponse("truncated".into()));
            }
            Ok(PanoramaMetadata {
                source: self.sources.get(pano_id).cloned(),
                ..Default::default()
            })
        }
    }

    struct FixedDetector {
        fail: bool,
    }

    impl Detector for FixedDetector {
        async fn detect(&self, image: Arc<RgbImage>) -> Result<Vec<Detection>, DetectionError> {
            if self.fail {
                return Err(DetectionError::InvalidResponse("model offline".into()));
            }
            assert_eq!(image.dimensions(), (64, 32));
            Ok(vec![Detection {
                x_normalized: 0.5,
                y_normalized: 0.5,
                confidence: 0.9,
            }])
        }
    }

    fn area() -> GeoArea {
        GeoArea::from_geometry(&json!({
            "type": "Polygon",
            "coordinates": [[
                [-123.121, 49.279], [-123.119, 49.279], [-123.119, 49.281],
                [-123.121, 49.281], [-123.121, 49.279]
            ]]
        }))
        .unwrap()
    }

    fn config(temp: &TempDir) -> CrawlConfig {
        CrawlConfig::new()
            .with_cache_dir(temp.path().join("cache"))
            .with_output(temp.path().join("out.jsonl"))
            .with_process_concurrency(4)
            .with_assembly(
                crate::config::AssemblyConfig::new()
                    .with_width(64)
                    .with_height(32)
                    .with_tile_concurrency(4),
            )
    }

    fn orchestrator(
        provider: FakeProvider,
        fail_detection: bool,
        temp: &TempDir,
    ) -> CrawlOrchestrator<FakeProvider, FixedDetector> {
        CrawlOrchestrator::new(
            Arc::new(provider),
            Arc::new(FixedDetector {
                fail: fail_detection,
            }),
            config(temp),
        )
    }

    fn lines(path: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_indoor_panorama_is_skipped() {
        let temp = TempDir::new().unwrap();
        let provider = FakeProvider::new(&[("OUT", "launch"), ("IN", "innerspace")]);
        let crawl = orchestrator(provider, false, &temp);
        let area = area();

        let report = crawl.run(&area).await.unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.succeeded, 1);
        assert!(report.is_clean());

        let records = lines(&temp.path().join("out.jsonl"));
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("\"panorama_id\":\"OUT\""));
        let ledger = ledger::ledger_path(&temp.path().join("cache"), area.digest());
        assert_eq!(lines(&ledger), vec!["OUT"]);
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_tallied() {
        let temp = TempDir::new().unwrap();
        let provider =
            FakeProvider::new(&[("OK", "launch"), ("GONE", "launch"), ("BAD_META", "launch")]);
        let crawl = orchestrator(provider, false, &temp);
        let area = area();

        let report = crawl.run(&area).await.unwrap();

        assert_eq!(report.pending, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failures_by_kind[&FailureKind::NotFound], 1);
        assert_eq!(report.failures_by_kind[&FailureKind::Metadata], 1);

        let ledger = ledger::ledger_path(&temp.path().join("cache"), area.digest());
        assert_eq!(lines(&ledger), vec!["OK"]);
    }

    #[tokio::test]
    async fn test_detection_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let provider = FakeProvider::new(&[("A", "launch")]);
        let crawl = orchestrator(provider, true, &temp);
        let area = area();

        let report = crawl.run(&area).await.unwrap();

        assert_eq!(report.failures_by_kind[&FailureKind::Detection], 1);
        assert!(lines(&temp.path().join("out.jsonl")).is_empty());
        let ledger = ledger::ledger_path(&temp.path().join("cache"), area.digest());
        assert!(lines(&ledger).is_empty());
    }

    #[tokio::test]
    async fn test_second_run_has_nothing_pending() {
        let temp = TempDir::new().unwrap();
        let area = area();

        let first = orchestrator(FakeProvider::new(&[("A", "launch"), ("B", "launch")]), false, &temp)
            .run(&area)
            .await
            .unwrap();
        assert_eq!(first.succeeded, 2);

        let second = orchestrator(FakeProvider::new(&[("A", "launch"), ("B", "launch")]), false, &temp)
            .run(&area)
            .await
            .unwrap();
        assert_eq!(second.found, 2);
        assert_eq!(second.already_processed, 2);
        assert_eq!(second.pending, 0);
        assert_eq!(lines(&temp.path().join("out.jsonl")).len(), 2);
    }

    #[tokio::test]
    async fn test_survey_reads_without_writing() {
        let temp = TempDir::new().unwrap();
        let area = area();
        let provider = Arc::new(FakeProvider::new(&[("A", "launch"), ("B", "launch")]));

        let (scan, report) = survey(provider, &config(&temp), &area).await.unwrap();

        assert_eq!(scan.len(), 2);
        assert_eq!(report.pending, 2);
        assert!(!temp.path().join("cache").exists());
        assert!(!temp.path().join("out.jsonl").exists());
    }

    #[test]
    fn test_item_error_kinds() {
        assert_eq!(
            ItemError::from(AssemblyError::Empty("P".into())).kind(),
            FailureKind::Empty
        );
        assert_eq!(
            ItemError::Metadata(ProviderError::NotFound("P".into())).kind(),
            FailureKind::Metadata
        );
        assert_eq!(ItemError::Panic("boom".into()).kind(), FailureKind::Panic);
    }

    #[test]
    fn test_short_digest() {
        assert_eq!(short_digest("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_digest("abc"), "abc");
    }
}
