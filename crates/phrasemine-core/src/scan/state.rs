//! Persisted traversal state.
//!
//! Multi-day scans survive interruption through a small JSON file mapping
//! every finished top-level path to the number of records it produced:
//!
//! ```json
//! { "processedFiles": { "/corpus/batch-001.tar.xz": 15320 } }
//! ```
//!
//! Entries are monotonic — never removed, never decreased — and the file
//! is rewritten wholesale on each flush. Flushes are time-based, not
//! per-file, bounding both write amplification and the reprocessing window
//! after a forced stop.

use std::collections::BTreeMap;
use std::fs;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

#[derive(Debug, Default, Deserialize)]
struct StateFile {
    #[serde(rename = "processedFiles")]
    processed_files: BTreeMap<String, u64>,
}

#[derive(Serialize)]
struct StateFileRef<'a> {
    #[serde(rename = "processedFiles")]
    processed_files: &'a BTreeMap<String, u64>,
}

/// Which top-level paths previous runs already finished, and how many
/// records each produced.
#[derive(Debug)]
pub struct ScanState {
    file: Option<Utf8PathBuf>,
    processed: BTreeMap<String, u64>,
    dirty: bool,
    last_flush: Instant,
    flush_interval: Duration,
}

impl ScanState {
    /// In-memory state without persistence, for single-run scans.
    pub fn ephemeral() -> Self {
        Self::build(None, BTreeMap::new())
    }

    /// Loads state from `path`, starting empty when the file does not
    /// exist yet.
    ///
    /// A file that exists but does not parse is an error, deliberately:
    /// silently starting over would reprocess the corpus undetected.
    pub fn load(path: &Utf8Path) -> StateResult<Self> {
        let processed = match fs::read(path) {
            Ok(bytes) => {
                let parsed: StateFile =
                    serde_json::from_slice(&bytes).map_err(|source| StateError::Corrupt {
                        path: path.to_owned(),
                        source,
                    })?;
                parsed.processed_files
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StateError::Read {
                    path: path.to_owned(),
                    source,
                });
            }
        };
        tracing::debug!(path = %path, entries = processed.len(), "traversal state loaded");
        Ok(Self::build(Some(path.to_owned()), processed))
    }

    fn build(file: Option<Utf8PathBuf>, processed: BTreeMap<String, u64>) -> Self {
        Self {
            file,
            processed,
            dirty: false,
            last_flush: Instant::now(),
            flush_interval: Duration::from_secs(60),
        }
    }

    /// Changes the flush cadence.
    pub const fn set_flush_interval(&mut self, interval: Duration) {
        self.flush_interval = interval;
    }

    /// `true` when `path` finished in a previous run (or this one).
    pub fn is_processed(&self, path: &Utf8Path) -> bool {
        self.processed.contains_key(path.as_str())
    }

    /// Record count for a finished `path`.
    pub fn records_for(&self, path: &Utf8Path) -> Option<u64> {
        self.processed.get(path.as_str()).copied()
    }

    /// Marks a top-level path as finished with `records` emitted.
    /// Re-marking keeps the larger count.
    pub fn mark(&mut self, path: &Utf8Path, records: u64) {
        let entry = self.processed.entry(path.as_str().to_owned()).or_insert(0);
        *entry = (*entry).max(records);
        self.dirty = true;
    }

    /// Number of finished paths.
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    /// `true` when no path has finished yet.
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    /// Flushes when dirty and the cadence interval has elapsed. Returns
    /// whether a flush happened.
    pub fn maybe_flush(&mut self) -> StateResult<bool> {
        if !self.dirty || self.last_flush.elapsed() < self.flush_interval {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Rewrites the state file wholesale, unconditionally.
    pub fn flush(&mut self) -> StateResult<()> {
        if let Some(path) = &self.file {
            let body = serde_json::to_vec(&StateFileRef {
                processed_files: &self.processed,
            })?;
            fs::write(path, body).map_err(|source| StateError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path, entries = self.processed.len(), "traversal state flushed");
        }
        self.dirty = false;
        self.last_flush = Instant::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_state_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8Path::from_path(dir.path())
            .unwrap()
            .join("state.json")
    }

    #[test]
    fn starts_empty_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = ScanState::load(&temp_state_path(&dir)).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn round_trips_through_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_state_path(&dir);
        let mut state = ScanState::load(&path).unwrap();
        state.mark(Utf8Path::new("/corpus/a.tar"), 12);
        state.mark(Utf8Path::new("/corpus/b.txt"), 0);
        state.flush().unwrap();

        let reloaded = ScanState::load(&path).unwrap();
        assert!(reloaded.is_processed(Utf8Path::new("/corpus/a.tar")));
        assert_eq!(reloaded.records_for(Utf8Path::new("/corpus/a.tar")), Some(12));
        assert_eq!(reloaded.records_for(Utf8Path::new("/corpus/b.txt")), Some(0));
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn file_format_is_the_processed_files_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_state_path(&dir);
        let mut state = ScanState::load(&path).unwrap();
        state.mark(Utf8Path::new("/x"), 3);
        state.flush().unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert_eq!(body, r#"{"processedFiles":{"/x":3}}"#);
    }

    #[test]
    fn marks_are_monotonic() {
        let mut state = ScanState::ephemeral();
        state.mark(Utf8Path::new("/x"), 10);
        state.mark(Utf8Path::new("/x"), 4);
        assert_eq!(state.records_for(Utf8Path::new("/x")), Some(10));
    }

    #[test]
    fn corrupt_state_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_state_path(&dir);
        fs::write(&path, b"{ not json").unwrap();
        let err = ScanState::load(&path).unwrap_err();
        assert!(matches!(err, StateError::Corrupt { .. }));
    }

    #[test]
    fn maybe_flush_respects_the_cadence() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_state_path(&dir);
        let mut state = ScanState::load(&path).unwrap();
        state.set_flush_interval(Duration::from_secs(3600));
        state.mark(Utf8Path::new("/x"), 1);
        assert!(!state.maybe_flush().unwrap());
        state.set_flush_interval(Duration::ZERO);
        assert!(state.maybe_flush().unwrap());
        assert!(!state.maybe_flush().unwrap());
    }
}
