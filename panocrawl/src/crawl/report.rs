//! Crawl tally.

use std::collections::BTreeMap;
use std::fmt;

/// Category of a per-item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    Metadata,
    NotFound,
    Empty,
    Reconstruct,
    Detection,
    Output,
    Ledger,
    Panic,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Metadata => "metadata",
            FailureKind::NotFound => "not_found",
            FailureKind::Empty => "empty",
            FailureKind::Reconstruct => "reconstruct",
            FailureKind::Detection => "detection",
            FailureKind::Output => "output",
            FailureKind::Ledger => "ledger",
            FailureKind::Panic => "panic",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts from one crawl.
///
/// `found = already_processed + pending` and, after the process phase,
/// `pending = skipped + succeeded + failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Distinct panoramas inside the area
    pub found: usize,
    /// Found panoramas already in the ledger
    pub already_processed: usize,
    /// Found panoramas not in the ledger
    pub pending: usize,
    /// Indoor captures skipped before assembly
    pub skipped: usize,
    /// Panoramas written to the output and ledger
    pub succeeded: usize,
    /// Panoramas that failed and will be retried next run
    pub failed: usize,
    /// Failure counts per category
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
}

impl CrawlReport {
    pub(crate) fn record_failure(&mut self, kind: FailureKind) {
        self.failed += 1;
        *self.failures_by_kind.entry(kind).or_insert(0) += 1;
    }

    /// Panoramas that reached a final outcome.
    pub fn processed(&self) -> usize {
        self.skipped + self.succeeded + self.failed
    }

    /// Returns true if nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Panoramas found in area:  {}", self.found)?;
        writeln!(f, "Already processed:        {}", self.already_processed)?;
        writeln!(f, "Pending:                  {}", self.pending)?;
        writeln!(f, "Skipped (indoor):         {}", self.skipped)?;
        writeln!(f, "Succeeded:                {}", self.succeeded)?;
        write!(f, "Failed:                   {}", self.failed)?;
        for (kind, count) in &self.failures_by_kind {
            write!(f, "\n  {:<22}{}", kind.as_str(), count)?;
        }
        Ok(())
    }
}
