//! Resumable filesystem traversal with archive descent.
//!
//! Walks a path depth-first, recursing into directories and descending
//! into archive containers as if they were subdirectories, and hands every
//! admitted document to a caller-supplied visitor. Traversal is strictly
//! sequential: one document at a time, never interleaved.
//!
//! Every *top-level unit* — a file reached outside any archive — is
//! recorded in the [`state::ScanState`] once it finishes, so an
//! interrupted multi-day run resumes by skipping finished units before any
//! I/O happens for them (an already-processed archive is not even opened).

pub mod archive;
pub mod results;
pub mod state;

use std::fs;
use std::io::Read;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSetBuilder};

use self::archive::{ArchiveKind, ArchiveReader};
use self::state::ScanState;
use crate::encoding;
use crate::error::{ScanError, ScanResult};

/// Node attributes offered to the path filter before any I/O on the node.
#[derive(Debug, Clone, Copy)]
pub struct PathQuery<'a> {
    /// `true` for directories. Archive entries are never directories here.
    pub is_dir: bool,
    /// The containing archive, when the node is an archive entry.
    pub archive: Option<&'a Utf8Path>,
    /// Filesystem path, or the entry path inside `archive`.
    pub path: &'a Utf8Path,
}

/// Path predicate; `false` prunes the node (and, for directories, its
/// whole subtree) without touching it.
pub type PathFilter = Box<dyn Fn(&PathQuery<'_>) -> bool>;

/// Consolidated traversal knobs, passed down the whole call chain instead
/// of a trail of optional arguments.
pub struct ScanPolicy {
    filter: Option<PathFilter>,
    buffer_contents: bool,
    flush_interval: Duration,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanPolicy {
    /// No filter, streamed contents, 60-second flush cadence.
    pub const fn new() -> Self {
        Self {
            filter: None,
            buffer_contents: false,
            flush_interval: Duration::from_secs(60),
        }
    }

    /// Sets the path predicate.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(&PathQuery<'_>) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Restricts files (and archive entries) to those matching any of
    /// `patterns`; directories still descend. Invalid patterns are skipped
    /// with a warning.
    #[must_use]
    pub fn with_file_globs(self, patterns: &[&str]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => tracing::warn!(pattern, error = %e, "skipping invalid glob pattern"),
            }
        }
        match builder.build() {
            Ok(set) => self.with_filter(move |q| q.is_dir || set.is_match(q.path.as_str())),
            Err(e) => {
                tracing::warn!(error = %e, "glob set failed to build; no filter installed");
                self
            }
        }
    }

    /// Fully buffers file/entry contents before the visitor runs, instead
    /// of streaming them out of the decompression pipeline.
    #[must_use]
    pub const fn buffer_contents(mut self, yes: bool) -> Self {
        self.buffer_contents = yes;
        self
    }

    /// Flush cadence for the traversal state.
    #[must_use]
    pub const fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }
}

/// A document handed to the visitor. Content is readable exactly once.
pub struct Document<'a> {
    /// The scan root this document was reached from.
    pub root: &'a Utf8Path,
    /// The containing archive, when the document is an archive entry.
    pub archive: Option<&'a Utf8Path>,
    /// Filesystem path, or the entry path inside `archive`.
    pub path: Utf8PathBuf,
    content: Content<'a>,
}

enum Content<'a> {
    Stream(&'a mut dyn Read),
    Buffered(Vec<u8>),
}

impl Document<'_> {
    /// Reads the full content bytes.
    pub fn read_bytes(&mut self) -> ScanResult<Vec<u8>> {
        match &mut self.content {
            Content::Stream(reader) => {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|source| ScanError::Io {
                        path: self.path.clone(),
                        source,
                    })?;
                Ok(bytes)
            }
            Content::Buffered(bytes) => Ok(std::mem::take(bytes)),
        }
    }

    /// Reads the content as text: byte-order mark, then any declared
    /// encoding, then lossy UTF-8.
    pub fn read_text(&mut self) -> ScanResult<String> {
        let bytes = self.read_bytes()?;
        Ok(encoding::decode_text(&bytes))
    }
}

/// Per-document callback. Returns the number of records it emitted, which
/// feeds the traversal state and the scan summary.
pub type Visitor<'v> = dyn FnMut(&mut Document<'_>) -> ScanResult<u64> + 'v;

/// What a scan did.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Visitor invocations.
    pub visited: u64,
    /// Records reported by the visitor.
    pub records: u64,
    /// Top-level units skipped because a previous run finished them.
    pub skipped: u64,
    /// Top-level units (or directories) that failed, with the failure
    /// text. Failed units stay unmarked and are retried on the next run.
    pub failures: Vec<(Utf8PathBuf, String)>,
}

/// Depth-first, resumable corpus walker.
pub struct Scanner {
    policy: ScanPolicy,
    state: ScanState,
    last_progress: Instant,
}

impl Scanner {
    /// A scanner with the given policy and (possibly ephemeral) state.
    pub fn new(policy: ScanPolicy, mut state: ScanState) -> Self {
        state.set_flush_interval(policy.flush_interval);
        Self {
            policy,
            state,
            last_progress: Instant::now(),
        }
    }

    /// The traversal state.
    pub const fn state(&self) -> &ScanState {
        &self.state
    }

    /// Walks `root` depth-first, feeding every admitted document to
    /// `visitor`.
    ///
    /// Unit-level failures land in the summary without stopping the scan;
    /// the error return covers a root that cannot be inspected at all and
    /// state persistence failures. The state is flushed on the policy
    /// cadence and once before returning.
    #[tracing::instrument(skip(self, visitor), fields(root = %root))]
    pub fn scan(&mut self, root: &Utf8Path, visitor: &mut Visitor<'_>) -> ScanResult<ScanSummary> {
        let meta = fs::metadata(root).map_err(|source| ScanError::Io {
            path: root.to_owned(),
            source,
        })?;
        let mut summary = ScanSummary::default();
        self.walk(root, root, meta.is_dir(), visitor, &mut summary)?;
        self.state.flush()?;
        tracing::info!(
            visited = summary.visited,
            records = summary.records,
            skipped = summary.skipped,
            failures = summary.failures.len(),
            "scan finished"
        );
        Ok(summary)
    }

    fn walk(
        &mut self,
        root: &Utf8Path,
        path: &Utf8Path,
        is_dir: bool,
        visitor: &mut Visitor<'_>,
        summary: &mut ScanSummary,
    ) -> ScanResult<()> {
        if let Some(filter) = &self.policy.filter
            && !filter(&PathQuery {
                is_dir,
                archive: None,
                path,
            })
        {
            return Ok(());
        }

        if is_dir {
            match Self::list_children(path) {
                Ok(children) => {
                    for (child, child_is_dir) in children {
                        self.walk(root, &child, child_is_dir, visitor, summary)?;
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "directory unreadable");
                    summary.failures.push((path.to_owned(), e.to_string()));
                }
            }
            return Ok(());
        }

        // A top-level unit. Consult the state before any I/O: a finished
        // archive must not even be reopened.
        if self.state.is_processed(path) {
            summary.skipped += 1;
            tracing::debug!(path = %path, "already processed; skipping");
            return Ok(());
        }

        match self.process_unit(root, path, visitor, summary) {
            Ok(records) => {
                self.state.mark(path, records);
                summary.records += records;
                self.state.maybe_flush()?;
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "top-level unit failed");
                summary.failures.push((path.to_owned(), e.to_string()));
            }
        }
        self.progress_tick(summary);
        Ok(())
    }

    /// Directory children in name order: stable, so interrupted runs see
    /// the same sequence.
    fn list_children(path: &Utf8Path) -> ScanResult<Vec<(Utf8PathBuf, bool)>> {
        let entries = fs::read_dir(path).map_err(|source| ScanError::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ScanError::Io {
                path: path.to_owned(),
                source,
            })?;
            let child = Utf8PathBuf::from_path_buf(entry.path())
                .map_err(|_| ScanError::NonUtf8Path {
                    path: path.to_owned(),
                })?;
            let file_type = entry.file_type().map_err(|source| ScanError::Io {
                path: child.clone(),
                source,
            })?;
            children.push((child, file_type.is_dir()));
        }
        children.sort();
        Ok(children)
    }

    fn process_unit(
        &mut self,
        root: &Utf8Path,
        path: &Utf8Path,
        visitor: &mut Visitor<'_>,
        summary: &mut ScanSummary,
    ) -> ScanResult<u64> {
        if ArchiveKind::detect(path).is_some() {
            self.process_archive(root, path, visitor, summary)
        } else {
            self.process_plain(root, path, visitor, summary)
        }
    }

    fn process_plain(
        &self,
        root: &Utf8Path,
        path: &Utf8Path,
        visitor: &mut Visitor<'_>,
        summary: &mut ScanSummary,
    ) -> ScanResult<u64> {
        let mut file = fs::File::open(path).map_err(|source| ScanError::Io {
            path: path.to_owned(),
            source,
        })?;
        let content = if self.policy.buffer_contents {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).map_err(|source| ScanError::Io {
                path: path.to_owned(),
                source,
            })?;
            Content::Buffered(bytes)
        } else {
            Content::Stream(&mut file)
        };
        let mut document = Document {
            root,
            archive: None,
            path: path.to_owned(),
            content,
        };
        summary.visited += 1;
        visitor(&mut document)
    }

    /// Processes every admitted entry of one archive. Any entry error
    /// fails the whole unit: a broken decompression pipeline cannot be
    /// trusted for the remaining entries.
    fn process_archive(
        &self,
        root: &Utf8Path,
        archive_path: &Utf8Path,
        visitor: &mut Visitor<'_>,
        summary: &mut ScanSummary,
    ) -> ScanResult<u64> {
        let mut reader = ArchiveReader::open(archive_path)?;
        let mut entries = reader.entries()?;
        let mut records = 0;
        while let Some(mut entry) = entries.next_file()? {
            if let Some(filter) = &self.policy.filter
                && !filter(&PathQuery {
                    is_dir: false,
                    archive: Some(archive_path),
                    path: entry.path(),
                })
            {
                continue;
            }
            let entry_path = entry.path().to_owned();
            let content = if self.policy.buffer_contents {
                let mut bytes = Vec::new();
                entry
                    .read_to_end(&mut bytes)
                    .map_err(|e| ScanError::Archive {
                        path: archive_path.to_owned(),
                        message: e.to_string(),
                    })?;
                Content::Buffered(bytes)
            } else {
                Content::Stream(&mut entry)
            };
            let mut document = Document {
                root,
                archive: Some(archive_path),
                path: entry_path,
                content,
            };
            summary.visited += 1;
            records += visitor(&mut document)?;
        }
        Ok(records)
    }

    fn progress_tick(&mut self, summary: &ScanSummary) {
        if self.last_progress.elapsed() >= Duration::from_secs(10) {
            self.last_progress = Instant::now();
            tracing::info!(
                visited = summary.visited,
                records = summary.records,
                skipped = summary.skipped,
                "scan progress"
            );
        }
    }
}
