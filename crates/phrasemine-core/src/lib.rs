//! Core mining engine for phrasemine.
//!
//! Scans large bodies of text — individual files, directory trees, nested
//! compressed archives — tokenizes the content and maintains a
//! memory-bounded frequency table over word n-grams ("phrases"), with a
//! pruning pass that separates phrases carrying their own frequency signal
//! from those fully explained by a longer containing phrase.
//!
//! # Modules
//!
//! - [`words`] - word interning cache
//! - [`tokenize`] - phrase/word segmentation
//! - [`key`] - canonical phrase keys
//! - [`stats`] - the bounded statistics table
//! - [`collect`] - per-document phrase collection
//! - [`preprocess`] / [`encoding`] - text preparation
//! - [`scan`] - resumable traversal with archive descent
//! - [`report`] - finalized table rendering
//! - [`config`] - job configuration
//! - [`error`] - error types and result aliases
//!
//! # Quick start
//!
//! ```
//! use phrasemine_core::{CollectorOptions, PhraseCollector, PhraseStats, WordCache};
//!
//! let mut collector = PhraseCollector::new(
//!     WordCache::new(),
//!     PhraseStats::default(),
//!     CollectorOptions::default(),
//! )
//! .expect("default token rules compile");
//!
//! assert_eq!(collector.add_text("the quick brown fox"), 4);
//! collector.stats_mut().reduce(true);
//! ```
#![deny(unsafe_code)]

pub mod collect;
pub mod config;
pub mod encoding;
pub mod error;
pub mod key;
pub mod preprocess;
pub mod report;
pub mod scan;
pub mod stats;
pub mod tokenize;
pub mod words;

pub use collect::{CollectorOptions, PhraseCollector};
pub use config::JobConfig;
pub use error::{ConfigError, ScanError, StateError, TokenizeError};
pub use scan::results::ResultsLog;
pub use scan::state::ScanState;
pub use scan::{Document, PathQuery, ScanPolicy, ScanSummary, Scanner};
pub use stats::{PhraseRecord, PhraseStats, PrunePolicy, StatsOptions};
pub use tokenize::{TokenRules, Tokenizer};
pub use words::{WordCache, WordId};
