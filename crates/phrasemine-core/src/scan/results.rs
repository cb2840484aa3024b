//! Accumulated-results log.
//!
//! An append-only pseudo-JSON-array file. Each appended batch writes `[`
//! (first use) or `,` (afterwards) followed by the batch's serialization
//! with its own enclosing brackets stripped, so appends never rewrite
//! earlier data. The file is therefore *not* valid JSON on disk: readers
//! append a synthetic trailing `]` before parsing. The format trades
//! strict validity for append efficiency and is preserved exactly for
//! compatibility with existing logs.

use std::fs::OpenOptions;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StateError, StateResult};

/// Append-only batch log.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: Utf8PathBuf,
}

impl ResultsLog {
    /// A log writing to `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Appends one batch. Empty batches are skipped.
    pub fn append<T: Serialize>(&self, batch: &[T]) -> StateResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let body = serde_json::to_string(batch)?;
        // Strip the batch's own enclosing brackets.
        let inner = &body[1..body.len() - 1];
        let lead = if self.path.exists() { "," } else { "[" };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StateError::Write {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(lead.as_bytes())
            .and_then(|()| file.write_all(inner.as_bytes()))
            .map_err(|source| StateError::Write {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path, items = batch.len(), "results batch appended");
        Ok(())
    }

    /// Reads every logged item back, tolerating the missing terminator.
    /// A log that was never written reads as empty.
    pub fn read<T: DeserializeOwned>(&self) -> StateResult<Vec<T>> {
        let mut text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        text.push(']');
        serde_json::from_str(&text).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        total: u64,
    }

    fn temp_log(dir: &tempfile::TempDir) -> ResultsLog {
        let path = Utf8Path::from_path(dir.path()).unwrap().join("log.json");
        ResultsLog::new(path)
    }

    #[test]
    fn unwritten_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = temp_log(&dir);
        let rows: Vec<Row> = log.read().unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn batches_accumulate_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = temp_log(&dir);
        log.append(&[Row { id: 1, total: 10 }, Row { id: 2, total: 20 }])
            .unwrap();
        log.append(&[Row { id: 3, total: 30 }]).unwrap();
        let rows: Vec<Row> = log.read().unwrap();
        assert_eq!(
            rows,
            vec![
                Row { id: 1, total: 10 },
                Row { id: 2, total: 20 },
                Row { id: 3, total: 30 },
            ]
        );
    }

    #[test]
    fn on_disk_form_is_an_unterminated_array() {
        let dir = tempfile::tempdir().unwrap();
        let log = temp_log(&dir);
        log.append(&[1, 2]).unwrap();
        log.append(&[3]).unwrap();
        let body = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(body, "[1,2,3");
    }

    #[test]
    fn empty_batches_leave_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let log = temp_log(&dir);
        log.append::<u32>(&[]).unwrap();
        assert!(!log.path().exists());
    }
}
