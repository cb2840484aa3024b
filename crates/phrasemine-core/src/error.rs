//! Error types for phrasemine-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when loading job configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from compiling tokenizer character classes.
#[derive(Error, Debug)]
pub enum TokenizeError {
    /// A configured character class produced an invalid pattern.
    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type alias using [`TokenizeError`].
pub type TokenizeResult<T> = Result<T, TokenizeError>;

/// Errors around the persisted traversal state and results log.
#[derive(Error, Debug)]
pub enum StateError {
    /// The file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that failed to read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but does not parse. Deliberately fatal: silently
    /// starting from empty state would reprocess the corpus undetected.
    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        /// File that failed to parse.
        path: Utf8PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// Serializing state for persistence failed.
    #[error("cannot encode state: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing the file failed.
    #[error("cannot write {path}: {source}")]
    Write {
        /// File that failed to write.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type alias using [`StateError`].
pub type StateResult<T> = Result<T, StateError>;

/// Errors raised while scanning a corpus.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Filesystem access failed.
    #[error("cannot access {path}: {source}")]
    Io {
        /// Path that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A path on disk is not valid UTF-8.
    #[error("non-UTF-8 path under {path}")]
    NonUtf8Path {
        /// Closest representable ancestor.
        path: Utf8PathBuf,
    },

    /// An archive could not be opened, or an entry was malformed. Aborts
    /// the containing top-level unit.
    #[error("archive {path}: {message}")]
    Archive {
        /// The archive file.
        path: Utf8PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The visitor reported a failure for a document.
    #[error("visitor failed on {path}: {message}")]
    Visitor {
        /// Document the visitor was handling.
        path: Utf8PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Persisting traversal state failed.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Result type alias using [`ScanError`].
pub type ScanResult<T> = Result<T, ScanError>;
