//! Pull-based archive entry reading.
//!
//! One abstraction over the supported container formats, yielding
//! `(path, reader)` pairs on demand:
//!
//! ```no_run
//! use camino::Utf8Path;
//! use phrasemine_core::scan::archive::ArchiveReader;
//!
//! let mut reader = ArchiveReader::open(Utf8Path::new("books.tar.xz")).unwrap();
//! let mut entries = reader.entries().unwrap();
//! while let Some(file) = entries.next_file().unwrap() {
//!     println!("{}", file.path());
//! }
//! ```
//!
//! Entries are processed strictly one at a time; the backends keep the
//! decompression pipeline consistent when an entry is skipped (the tar
//! backend drains unread bytes on advance, the zip backend only
//! decompresses entries that are actually read).

use std::fs::File;
use std::io::{BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

use crate::error::{ScanError, ScanResult};

/// Container formats the traversal engine descends into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Plain `.tar`.
    Tar,
    /// Gzip-compressed tar (`.tar.gz`, `.tgz`).
    TarGz,
    /// Xz-compressed tar (`.tar.xz`, `.txz`).
    TarXz,
    /// `.zip`.
    Zip,
}

impl ArchiveKind {
    /// Detects the container format from the file name, if any.
    pub fn detect(path: &Utf8Path) -> Option<Self> {
        let name = path.file_name()?.to_ascii_lowercase();
        if name.ends_with(".tar") {
            Some(Self::Tar)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(Self::TarXz)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// An opened archive container.
pub struct ArchiveReader {
    path: Utf8PathBuf,
    backend: Backend,
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.backend {
            Backend::Tar(_) => "Tar",
            Backend::Zip(_) => "Zip",
        };
        f.debug_struct("ArchiveReader")
            .field("path", &self.path)
            .field("backend", &kind)
            .finish()
    }
}

enum Backend {
    Tar(Box<tar::Archive<Box<dyn Read>>>),
    Zip(zip::ZipArchive<BufReader<File>>),
}

impl ArchiveReader {
    /// Opens `path` with the decompression pipeline its format needs.
    pub fn open(path: &Utf8Path) -> ScanResult<Self> {
        let kind = ArchiveKind::detect(path).ok_or_else(|| ScanError::Archive {
            path: path.to_owned(),
            message: "unrecognized container format".to_string(),
        })?;
        let file = File::open(path).map_err(|source| ScanError::Io {
            path: path.to_owned(),
            source,
        })?;
        let backend = match kind {
            ArchiveKind::Tar => {
                let reader: Box<dyn Read> = Box::new(BufReader::new(file));
                Backend::Tar(Box::new(tar::Archive::new(reader)))
            }
            ArchiveKind::TarGz => {
                let reader: Box<dyn Read> = Box::new(GzDecoder::new(BufReader::new(file)));
                Backend::Tar(Box::new(tar::Archive::new(reader)))
            }
            ArchiveKind::TarXz => {
                let reader: Box<dyn Read> = Box::new(XzDecoder::new(BufReader::new(file)));
                Backend::Tar(Box::new(tar::Archive::new(reader)))
            }
            ArchiveKind::Zip => {
                let archive =
                    zip::ZipArchive::new(BufReader::new(file)).map_err(|e| ScanError::Archive {
                        path: path.to_owned(),
                        message: e.to_string(),
                    })?;
                Backend::Zip(archive)
            }
        };
        Ok(Self {
            path: path.to_owned(),
            backend,
        })
    }

    /// Starts pulling file entries. Call once per opened archive.
    pub fn entries(&mut self) -> ScanResult<ArchiveEntries<'_>> {
        let inner = match &mut self.backend {
            Backend::Tar(archive) => {
                let entries = archive.entries().map_err(|source| ScanError::Io {
                    path: self.path.clone(),
                    source,
                })?;
                EntriesInner::Tar(entries)
            }
            Backend::Zip(archive) => EntriesInner::Zip { archive, index: 0 },
        };
        Ok(ArchiveEntries {
            path: &self.path,
            inner,
        })
    }
}

/// Pull iterator over an archive's regular file entries.
pub struct ArchiveEntries<'a> {
    path: &'a Utf8Path,
    inner: EntriesInner<'a>,
}

enum EntriesInner<'a> {
    Tar(tar::Entries<'a, Box<dyn Read>>),
    Zip {
        archive: &'a mut zip::ZipArchive<BufReader<File>>,
        index: usize,
    },
}

impl ArchiveEntries<'_> {
    /// The next regular file entry, or `None` at the end.
    ///
    /// Directory entries are skipped. Any unread bytes of the previous
    /// entry are drained before the next one is parsed.
    pub fn next_file(&mut self) -> ScanResult<Option<ArchiveFile<'_>>> {
        let archive_path = self.path;
        match &mut self.inner {
            EntriesInner::Tar(entries) => loop {
                let Some(entry) = entries.next() else {
                    return Ok(None);
                };
                let entry = entry.map_err(|e| ScanError::Archive {
                    path: archive_path.to_owned(),
                    message: e.to_string(),
                })?;
                if !entry.header().entry_type().is_file() {
                    continue;
                }
                let raw_path = entry.path().map_err(|e| ScanError::Archive {
                    path: archive_path.to_owned(),
                    message: e.to_string(),
                })?;
                let entry_path = Utf8PathBuf::from_path_buf(raw_path.into_owned())
                    .map_err(|_| ScanError::NonUtf8Path {
                        path: archive_path.to_owned(),
                    })?;
                return Ok(Some(ArchiveFile {
                    path: entry_path,
                    reader: EntryReader::Tar(Box::new(entry)),
                }));
            },
            EntriesInner::Zip { archive, index } => {
                // Advance past directory entries in a borrow that ends each
                // iteration, so the terminal `by_index` below can hold the
                // only live borrow of the archive for the returned reader.
                while *index < archive.len() {
                    let is_dir = archive
                        .by_index(*index)
                        .map_err(|e| ScanError::Archive {
                            path: archive_path.to_owned(),
                            message: e.to_string(),
                        })?
                        .is_dir();
                    if !is_dir {
                        break;
                    }
                    *index += 1;
                }
                if *index >= archive.len() {
                    return Ok(None);
                }
                let i = *index;
                *index += 1;
                let file = archive.by_index(i).map_err(|e| ScanError::Archive {
                    path: archive_path.to_owned(),
                    message: e.to_string(),
                })?;
                let entry_path = Utf8PathBuf::from(file.name().to_string());
                Ok(Some(ArchiveFile {
                    path: entry_path,
                    reader: EntryReader::Zip(Box::new(file)),
                }))
            }
        }
    }
}

/// One file entry, readable exactly once, valid until the next pull.
pub struct ArchiveFile<'a> {
    path: Utf8PathBuf,
    reader: EntryReader<'a>,
}

enum EntryReader<'a> {
    Tar(Box<dyn Read + 'a>),
    Zip(Box<dyn Read + 'a>),
}

impl ArchiveFile<'_> {
    /// The entry's path inside the archive.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Read for ArchiveFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.reader {
            EntryReader::Tar(entry) => entry.read(buf),
            EntryReader::Zip(file) => file.read(buf),
        }
    }
}
