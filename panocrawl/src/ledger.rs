//! Processing ledger.
//!
//! Records the ids of panoramas whose output record has been durably written,
//! one id per line in `<cache_dir>/<area digest>/already_processed.txt`. The
//! file is read once when opened and only appended to afterwards; each append
//! is flushed and synced before it returns, so a crash leaves a valid prefix.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Name of the ledger file inside the area directory.
pub const LEDGER_FILE_NAME: &str = "already_processed.txt";

/// Ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to create ledger directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read ledger {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to append to ledger {}: {source}", path.display())]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid panorama id {0:?}")]
    InvalidId(String),
}

/// Append-only set of completed panorama ids for one area.
#[derive(Debug)]
pub struct ProcessingLedger {
    path: PathBuf,
    completed: HashSet<String>,
    file: Mutex<File>,
}

impl ProcessingLedger {
    /// Opens (creating if needed) the ledger for an area digest.
    pub async fn open(cache_dir: &Path, area_digest: &str) -> Result<Self, LedgerError> {
        let dir = cache_dir.join(area_digest);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| LedgerError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let path = dir.join(LEDGER_FILE_NAME);
        let content = read_ledger(&path).await?;
        let completed = parse_entries(&content);

        let append_error = |source| LedgerError::Append {
            path: path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(append_error)?;

        // A crash mid-append can leave the last line unterminated
        if !content.is_empty() && !content.ends_with('\n') {
            debug!(path = %path.display(), "Terminating torn ledger line");
            terminate_line(&mut file).await.map_err(append_error)?;
        }

        debug!(path = %path.display(), entries = completed.len(), "Ledger opened");

        Ok(Self {
            path,
            completed,
            file: Mutex::new(file),
        })
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of ids recorded when the ledger was opened.
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Returns true if the id was already complete when the ledger was opened.
    pub fn contains(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    /// Returns the ids not yet recorded, sorted.
    pub fn pending<'a, I>(&self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .filter(|id| !self.completed.contains(*id))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Durably records one completed id.
    ///
    /// Returns only after the line has been flushed and synced to disk.
    pub async fn append(&self, id: &str) -> Result<(), LedgerError> {
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(LedgerError::InvalidId(id.to_string()));
        }

        let line = format!("{}\n", id);
        let mut file = self.file.lock().await;
        let result = async {
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        result.map_err(|source| LedgerError::Append {
            path: self.path.clone(),
            source,
        })
    }
}

/// Path of the ledger file for an area digest.
pub fn ledger_path(cache_dir: &Path, area_digest: &str) -> PathBuf {
    cache_dir.join(area_digest).join(LEDGER_FILE_NAME)
}

/// Reads the completed ids for an area without opening it for writing.
///
/// A missing ledger is empty.
pub async fn read_completed(
    cache_dir: &Path,
    area_digest: &str,
) -> Result<HashSet<String>, LedgerError> {
    let content = read_ledger(&ledger_path(cache_dir, area_digest)).await?;
    Ok(parse_entries(&content))
}

/// Reads the raw ledger; a missing file reads as empty.
async fn read_ledger(path: &Path) -> Result<String, LedgerError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(LedgerError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_entries(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

async fn terminate_line(file: &mut File) -> std::io::Result<()> {
    file.write_all(b"\n").await?;
    file.flush().await?;
    file.sync_data().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DIGEST: &str = "0f3a";

    #[tokio::test]
    async fn test_open_creates_area_directory() {
        let temp = TempDir::new().unwrap();
        let ledger = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();

        assert!(ledger.is_empty());
        assert_eq!(
            ledger.path(),
            temp.path().join(DIGEST).join(LEDGER_FILE_NAME)
        );
        assert!(ledger.path().exists());
    }

    #[tokio::test]
    async fn test_append_is_visible_after_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let ledger = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();
            ledger.append("PANO_A").await.unwrap();
            ledger.append("PANO_B").await.unwrap();
            // Appends do not change the in-memory snapshot
            assert!(!ledger.contains("PANO_A"));
        }

        let reopened = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.contains("PANO_A"));
        assert!(reopened.contains("PANO_B"));

        let content = std::fs::read_to_string(reopened.path()).unwrap();
        assert_eq!(content, "PANO_A\nPANO_B\n");
    }

    #[tokio::test]
    async fn test_pending_is_sorted_difference() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(DIGEST);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(LEDGER_FILE_NAME), "B\n  D  \n\n").unwrap();

        let ledger = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();
        assert_eq!(ledger.len(), 2);

        let pending = ledger.pending(["E", "B", "A", "D", "C", "A"]);
        assert_eq!(pending, vec!["A", "C", "E"]);
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let temp = TempDir::new().unwrap();
        let first = ProcessingLedger::open(temp.path(), "aaaa").await.unwrap();
        first.append("PANO").await.unwrap();

        let second = ProcessingLedger::open(temp.path(), "bbbb").await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_produce_whole_lines() {
        let temp = TempDir::new().unwrap();
        let ledger = std::sync::Arc::new(
            ProcessingLedger::open(temp.path(), DIGEST).await.unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..20 {
            let ledger = std::sync::Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.append(&format!("PANO_{:02}", i)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reopened = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();
        assert_eq!(reopened.len(), 20);
        let content = std::fs::read_to_string(reopened.path()).unwrap();
        assert_eq!(content.lines().count(), 20);
    }

    #[tokio::test]
    async fn test_read_completed_does_not_create_files() {
        let temp = TempDir::new().unwrap();
        let completed = read_completed(temp.path(), DIGEST).await.unwrap();

        assert!(completed.is_empty());
        assert!(!temp.path().join(DIGEST).exists());

        let ledger = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();
        ledger.append("PANO").await.unwrap();
        let completed = read_completed(temp.path(), DIGEST).await.unwrap();
        assert!(completed.contains("PANO"));
    }

    #[tokio::test]
    async fn test_torn_last_line_does_not_swallow_next_append() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(DIGEST);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(LEDGER_FILE_NAME), "PANO_A\nPAN").unwrap();

        let ledger = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();
        assert!(ledger.contains("PANO_A"));
        ledger.append("PANO_B").await.unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, "PANO_A\nPAN\nPANO_B\n");

        let reopened = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();
        assert!(reopened.contains("PANO_B"));
        // Already terminated, so reopening adds nothing
        let content = std::fs::read_to_string(reopened.path()).unwrap();
        assert_eq!(content, "PANO_A\nPAN\nPANO_B\n");
    }

    #[tokio::test]
    async fn test_rejects_multiline_id() {
        let temp = TempDir::new().unwrap();
        let ledger = ProcessingLedger::open(temp.path(), DIGEST).await.unwrap();
        assert!(matches!(
            ledger.append("A\nB").await,
            Err(LedgerError::InvalidId(_))
        ));
        assert!(matches!(ledger.append("").await, Err(LedgerError::InvalidId(_))));
    }
}
