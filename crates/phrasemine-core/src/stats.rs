//! Phrase statistics table.
//!
//! A memory-bounded multiset over canonical phrase keys. Counting is cheap
//! and unordered; ordering work is deferred to [`PhraseStats::reduce`],
//! which only runs once the table has grown a hysteresis band past the hard
//! cap (or when forced).
//!
//! Every ordering decision is pinned by a per-record insertion sequence, so
//! a table fed the same input always reduces to the same result.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::key;
use crate::words::WordId;

/// How [`PhraseStats::reduce`] prunes the table down to `max_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrunePolicy {
    /// Debit each phrase's occurrences from its contained sub-phrases and
    /// drop records whose residual reaches zero: a phrase that only ever
    /// appears inside one longer phrase carries no signal of its own.
    #[default]
    SelfCount,
    /// Rank by raw count and truncate. No subsumption analysis; the right
    /// policy for plain frequency lists.
    CountRank,
}

/// Sizing and pruning options for a [`PhraseStats`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsOptions {
    /// Hard cap on the table size after a reduction.
    pub max_count: usize,
    /// Hysteresis band above `max_count` before a non-forced reduction
    /// runs, amortizing the sort cost.
    pub buffer_count: usize,
    /// Pruning policy.
    pub policy: PrunePolicy,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            max_count: 100_000,
            buffer_count: 50_000,
            policy: PrunePolicy::default(),
        }
    }
}

/// Per-phrase bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct PhraseRecord {
    /// Total occurrences counted for this phrase.
    pub count: u64,
    /// Number of words in the phrase.
    pub words_count: u32,
    /// Residual occurrences after the latest self-count pass; transient.
    pub self_count: i64,
    /// Set during a reduction on records scheduled to drop; transient.
    #[serde(skip)]
    pub excluded: bool,
    /// Key of the longest phrase that subsumed this one in the latest
    /// self-count pass. A weak, lookup-only association: the named record
    /// may itself have been evicted since.
    #[serde(skip)]
    pub parent: Option<String>,
    #[serde(skip)]
    seq: u64,
}

/// Memory-bounded phrase frequency table.
pub struct PhraseStats {
    records: HashMap<String, PhraseRecord>,
    opts: StatsOptions,
    next_seq: u64,
}

impl Default for PhraseStats {
    fn default() -> Self {
        Self::new(StatsOptions::default())
    }
}

impl PhraseStats {
    /// Creates an empty table with the given options.
    pub fn new(opts: StatsOptions) -> Self {
        Self {
            records: HashMap::new(),
            opts,
            next_seq: 0,
        }
    }

    /// The options this table was built with.
    pub const fn options(&self) -> &StatsOptions {
        &self.opts
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up one record.
    pub fn get(&self, phrase_key: &str) -> Option<&PhraseRecord> {
        self.records.get(phrase_key)
    }

    /// `true` when `phrase_key` is in the table.
    pub fn contains(&self, phrase_key: &str) -> bool {
        self.records.contains_key(phrase_key)
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next_seq = 0;
    }

    /// Counts `weight` occurrences of the phrase `phrase_key`.
    ///
    /// Creates the record on first sight with the given `words_count`.
    /// May trigger a non-forced reduction.
    pub fn add(&mut self, phrase_key: &str, words_count: u32, weight: u64) {
        let next_seq = &mut self.next_seq;
        self.records
            .entry(phrase_key.to_string())
            .and_modify(|r| r.count += weight)
            .or_insert_with(|| {
                let seq = *next_seq;
                *next_seq += 1;
                PhraseRecord {
                    count: weight,
                    words_count,
                    self_count: 0,
                    excluded: false,
                    parent: None,
                    seq,
                }
            });
        self.reduce(false);
    }

    /// Counts every contiguous sub-phrase of `word_ids` up to
    /// `max_phrase_length` words, each weighted by `weight`.
    ///
    /// `filter` sees the canonical key and can veto a sub-phrase before it
    /// is counted. Complexity is O(n · max_phrase_length) per call.
    pub fn add_combines(
        &mut self,
        word_ids: &[WordId],
        weight: u64,
        max_phrase_length: Option<usize>,
        filter: Option<&dyn Fn(&str) -> bool>,
    ) {
        let n = word_ids.len();
        for i in 0..n {
            let end = max_phrase_length.map_or(n, |max| n.min(i + max));
            for j in (i + 1)..=end {
                let phrase_key = key::encode(&word_ids[i..j]);
                if let Some(f) = filter
                    && !f(&phrase_key)
                {
                    continue;
                }
                self.add(&phrase_key, (j - i) as u32, weight);
            }
        }
    }

    /// Applies the configured pruning policy.
    ///
    /// Non-forced calls return immediately while the table is inside the
    /// hysteresis band (`max_count + buffer_count`). Afterwards the table
    /// holds at most `max_count` records, in ranked order.
    pub fn reduce(&mut self, force: bool) {
        if !force && self.records.len() <= self.opts.max_count + self.opts.buffer_count {
            return;
        }
        if self.records.is_empty() {
            return;
        }
        let before = self.records.len();
        match self.opts.policy {
            PrunePolicy::SelfCount => self.reduce_self_count(),
            PrunePolicy::CountRank => self.reduce_count_rank(),
        }
        tracing::debug!(before, after = self.records.len(), "phrase table reduced");
    }

    /// All live records in table order: insertion order between reductions,
    /// ranked order immediately after one.
    pub fn entries(&self) -> Vec<(&str, &PhraseRecord)> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(k, r)| (k.as_str(), r))
            .collect();
        entries.sort_by_key(|(_, r)| r.seq);
        entries
    }

    /// Live records in insertion order, removed from the table.
    fn drain_ordered(&mut self) -> Vec<(String, PhraseRecord)> {
        let mut entries: Vec<_> = self.records.drain().collect();
        entries.sort_by_key(|(_, r)| r.seq);
        entries
    }

    /// Reinstalls `entries` as the table, renumbering the sequence so that
    /// table order equals the given order.
    fn rebuild(&mut self, entries: Vec<(String, PhraseRecord)>) {
        self.next_seq = 0;
        self.records = entries
            .into_iter()
            .map(|(k, mut r)| {
                r.seq = self.next_seq;
                self.next_seq += 1;
                (k, r)
            })
            .collect();
    }

    fn reduce_count_rank(&mut self) {
        let mut entries = self.drain_ordered();
        entries.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(a.1.words_count.cmp(&b.1.words_count))
        });
        entries.truncate(self.opts.max_count);
        self.rebuild(entries);
    }

    fn reduce_self_count(&mut self) {
        // Longest phrases first; stable over insertion order within a length.
        let mut order: Vec<(u64, u32, String)> = self
            .records
            .iter()
            .map(|(k, r)| (r.seq, r.words_count, k.clone()))
            .collect();
        order.sort_by_key(|(seq, _, _)| *seq);
        order.sort_by_key(|(_, len, _)| Reverse(*len));

        for r in self.records.values_mut() {
            r.self_count = r.count as i64;
            r.excluded = false;
            r.parent = None;
        }

        for (_, words_count, phrase_key) in &order {
            if *words_count < 2 {
                continue;
            }
            let debit = match self.records.get(phrase_key) {
                Some(r) if r.self_count > 0 => r.self_count,
                // Already fully explained by a longer phrase: not
                // independent evidence for anything it contains.
                _ => continue,
            };
            let Some(ids) = key::decode(phrase_key) else {
                continue;
            };
            let n = ids.len();
            for i in 0..n {
                for j in (i + 1)..=n {
                    if i == 0 && j == n {
                        continue;
                    }
                    let sub = key::encode(&ids[i..j]);
                    if let Some(rec) = self.records.get_mut(&sub) {
                        rec.self_count -= debit;
                        if rec.parent.is_none() {
                            rec.parent = Some(phrase_key.clone());
                        }
                    }
                }
            }
        }

        for r in self.records.values_mut() {
            if r.self_count <= 0 {
                r.excluded = true;
            }
        }

        let mut survivors: Vec<(String, PhraseRecord)> = self
            .drain_ordered()
            .into_iter()
            .filter(|(_, r)| !r.excluded)
            .collect();
        survivors.sort_by(|a, b| {
            b.1.self_count
                .cmp(&a.1.self_count)
                .then(b.1.words_count.cmp(&a.1.words_count))
        });
        survivors.truncate(self.opts.max_count);
        self.rebuild(survivors);
    }
}
