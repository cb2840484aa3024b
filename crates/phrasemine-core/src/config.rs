//! Job configuration.
//!
//! A mining job is described by one [`JobConfig`] value. Loading merges,
//! lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. An optional explicit file (TOML, or JSON by extension)
//! 3. `PHRASEMINE_*` environment variables
//!
//! # Example
//! ```no_run
//! use camino::Utf8Path;
//! use phrasemine_core::config::JobConfig;
//!
//! let config = JobConfig::load(Some(Utf8Path::new("job.toml"))).unwrap();
//! assert!(config.max_count >= config.buffer_count);
//! ```

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::collect::CollectorOptions;
use crate::error::{ConfigError, ConfigResult};
use crate::scan::ScanPolicy;
use crate::stats::{PrunePolicy, StatsOptions};
use crate::tokenize::TokenRules;

/// Everything a mining job needs to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Hard cap on the phrase table after a reduction.
    pub max_count: usize,
    /// Hysteresis band above `max_count` before a non-forced reduction.
    pub buffer_count: usize,
    /// Pruning policy.
    pub policy: PrunePolicy,
    /// Longest counted sub-phrase, in words. Omit for unbounded.
    pub max_phrase_length: Option<usize>,
    /// Tokenizer character classes.
    pub token_rules: TokenRules,
    /// Seconds between traversal-state flushes.
    pub flush_interval_secs: u64,
    /// Fully buffer archive-entry contents instead of streaming them.
    pub buffer_archive_entries: bool,
    /// Traversal state file. Omit to disable resumability.
    pub state_file: Option<Utf8PathBuf>,
    /// Accumulated-results log file.
    pub results_file: Option<Utf8PathBuf>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_count: 100_000,
            buffer_count: 50_000,
            policy: PrunePolicy::default(),
            max_phrase_length: None,
            token_rules: TokenRules::default(),
            flush_interval_secs: 60,
            buffer_archive_entries: false,
            state_file: None,
            results_file: None,
        }
    }
}

impl JobConfig {
    /// Loads configuration: defaults, then `file`, then `PHRASEMINE_*`
    /// environment variables.
    #[tracing::instrument]
    pub fn load(file: Option<&Utf8Path>) -> ConfigResult<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = match path.extension() {
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment = figment.merge(Env::prefixed("PHRASEMINE_").lowercase(true));
        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::debug!(?file, "configuration loaded");
        Ok(config)
    }

    /// The table options slice of this config.
    pub const fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            max_count: self.max_count,
            buffer_count: self.buffer_count,
            policy: self.policy,
        }
    }

    /// Collector options for this config. Filters and custom preprocessing
    /// are job code, not configuration; they start out unset.
    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions {
            token_rules: self.token_rules.clone(),
            max_phrase_length: self.max_phrase_length,
            ..CollectorOptions::default()
        }
    }

    /// Traversal policy for this config, without a path filter.
    pub fn scan_policy(&self) -> ScanPolicy {
        ScanPolicy::new()
            .buffer_contents(self.buffer_archive_entries)
            .flush_interval(Duration::from_secs(self.flush_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_the_engine_constants() {
        let config = JobConfig::default();
        assert_eq!(config.max_count, 100_000);
        assert_eq!(config.buffer_count, 50_000);
        assert_eq!(config.policy, PrunePolicy::SelfCount);
        assert_eq!(config.flush_interval_secs, 60);
        assert_eq!(config.max_phrase_length, None);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "max_count = 10\npolicy = \"count-rank\"\n[token_rules]\nletters = \"a-z\""
        )
        .unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();
        let config = JobConfig::load(Some(path)).unwrap();
        assert_eq!(config.max_count, 10);
        assert_eq!(config.policy, PrunePolicy::CountRank);
        assert_eq!(config.token_rules.letters, "a-z");
        // Untouched fields keep their defaults.
        assert_eq!(config.buffer_count, 50_000);
        assert_eq!(config.token_rules.joiners, TokenRules::default().joiners);
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let config = JobConfig::load(Some(Utf8Path::new("/nonexistent/job.toml"))).unwrap();
        assert_eq!(config, JobConfig::default());
    }

    #[test]
    fn stats_options_mirror_the_caps() {
        let config = JobConfig {
            max_count: 7,
            buffer_count: 3,
            policy: PrunePolicy::CountRank,
            ..JobConfig::default()
        };
        let opts = config.stats_options();
        assert_eq!(opts.max_count, 7);
        assert_eq!(opts.buffer_count, 3);
        assert_eq!(opts.policy, PrunePolicy::CountRank);
    }
}
