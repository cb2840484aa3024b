//! Phrase collection over one document.
//!
//! Glues the tokenizer, the word cache and the statistics table together
//! for a single text: preprocess, filter, segment, intern, count.

use crate::error::TokenizeResult;
use crate::preprocess;
use crate::stats::PhraseStats;
use crate::tokenize::{TokenRules, Tokenizer};
use crate::words::{WordCache, WordId};

/// Pluggable whole-text preprocessing step.
pub type TextPreprocessor = Box<dyn Fn(&str) -> String>;

/// Whole-text inclusion filter; `false` rejects the document.
pub type TextFilter = Box<dyn Fn(&str) -> bool>;

/// Per-phrase filter over canonical keys; `false` skips the phrase.
pub type PhraseFilter = Box<dyn Fn(&str) -> bool>;

/// Per-word filter over normalized words; `false` drops the word.
pub type WordFilter = Box<dyn Fn(&str) -> bool>;

/// Knobs for a [`PhraseCollector`].
#[derive(Default)]
pub struct CollectorOptions {
    /// Tokenizer character classes.
    pub token_rules: TokenRules,
    /// Longest counted sub-phrase, in words. `None` is unbounded.
    pub max_phrase_length: Option<usize>,
    /// Replaces the default preprocessing when set.
    pub preprocess: Option<TextPreprocessor>,
    /// Whole-text inclusion filter.
    pub filter_text: Option<TextFilter>,
    /// Per-phrase filter.
    pub filter_phrases: Option<PhraseFilter>,
    /// Per-word filter. A rejected word splits the surrounding run: the
    /// fragments on either side are combined independently, so a dropped
    /// word never glues its neighbors into a phrase the text does not
    /// contain.
    pub filter_words: Option<WordFilter>,
}

/// Feeds documents through the tokenizer into a phrase table.
///
/// The cache and table are injected explicitly and owned for the duration
/// of the job; [`PhraseCollector::into_parts`] releases them for reporting.
pub struct PhraseCollector {
    tokenizer: Tokenizer,
    words: WordCache,
    stats: PhraseStats,
    opts: CollectorOptions,
}

impl PhraseCollector {
    /// Builds a collector around the given cache and table.
    pub fn new(
        words: WordCache,
        stats: PhraseStats,
        opts: CollectorOptions,
    ) -> TokenizeResult<Self> {
        let tokenizer = Tokenizer::new(&opts.token_rules)?;
        Ok(Self {
            tokenizer,
            words,
            stats,
            opts,
        })
    }

    /// Collects phrase statistics from `text`.
    ///
    /// Returns the number of words that entered the table. A document
    /// rejected by the text filter contributes nothing and returns 0.
    #[tracing::instrument(skip_all, fields(text_len = text.len()))]
    pub fn add_text(&mut self, text: &str) -> usize {
        let text = match &self.opts.preprocess {
            Some(f) => f(text),
            None => preprocess::preprocess_default(text),
        };
        if let Some(filter) = &self.opts.filter_text
            && !filter(&text)
        {
            return 0;
        }

        let max_len = self.opts.max_phrase_length;
        let mut total = 0;
        for phrase in self.tokenizer.phrases(&text) {
            let mut run: Vec<WordId> = Vec::new();
            for word in self.tokenizer.words(phrase) {
                if let Some(f) = &self.opts.filter_words
                    && !f(&self.words.normalize_key(word))
                {
                    if !run.is_empty() {
                        self.stats.add_combines(
                            &run,
                            1,
                            max_len,
                            self.opts.filter_phrases.as_deref(),
                        );
                        run.clear();
                    }
                    continue;
                }
                run.push(self.words.put(word));
                total += 1;
            }
            if !run.is_empty() {
                self.stats
                    .add_combines(&run, 1, max_len, self.opts.filter_phrases.as_deref());
            }
        }
        total
    }

    /// The word cache.
    pub const fn words(&self) -> &WordCache {
        &self.words
    }

    /// The statistics table.
    pub const fn stats(&self) -> &PhraseStats {
        &self.stats
    }

    /// Mutable table access, e.g. to force a final reduction.
    pub const fn stats_mut(&mut self) -> &mut PhraseStats {
        &mut self.stats
    }

    /// Clears cache and table for the next independent job.
    pub fn clear(&mut self) {
        self.words.clear();
        self.stats.clear();
    }

    /// Releases the cache and table.
    pub fn into_parts(self) -> (WordCache, PhraseStats) {
        (self.words, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(opts: CollectorOptions) -> PhraseCollector {
        PhraseCollector::new(WordCache::new(), PhraseStats::default(), opts).unwrap()
    }

    #[test]
    fn counts_words_across_phrases() {
        let mut c = collector(CollectorOptions::default());
        assert_eq!(c.add_text("one two\r\nthree"), 3);
        assert!(c.stats().contains("1_2"));
        assert!(!c.stats().contains("2_3"));
    }

    #[test]
    fn rejected_text_has_no_side_effects() {
        let mut c = collector(CollectorOptions {
            filter_text: Some(Box::new(|t| !t.contains("skip"))),
            ..CollectorOptions::default()
        });
        assert_eq!(c.add_text("please skip this"), 0);
        assert!(c.stats().is_empty());
        assert!(c.words().is_empty());
    }

    #[test]
    fn word_filter_splits_the_run() {
        let mut c = collector(CollectorOptions {
            filter_words: Some(Box::new(|w| w != "b")),
            ..CollectorOptions::default()
        });
        assert_eq!(c.add_text("a b c"), 2);
        let a = c.words().get_id("a").unwrap();
        let cc = c.words().get_id("c").unwrap();
        assert!(c.words().get_id("b").is_none());
        assert!(c.stats().contains(&a.to_string()));
        assert!(c.stats().contains(&cc.to_string()));
        assert!(!c.stats().contains(&format!("{a}_{cc}")));
    }

    #[test]
    fn phrase_filter_vetoes_keys() {
        let mut c = collector(CollectorOptions {
            filter_phrases: Some(Box::new(|k| k.contains('_'))),
            ..CollectorOptions::default()
        });
        c.add_text("x y");
        assert!(c.stats().contains("1_2"));
        assert!(!c.stats().contains("1"));
    }

    #[test]
    fn max_phrase_length_caps_combinations() {
        let mut c = collector(CollectorOptions {
            max_phrase_length: Some(2),
            ..CollectorOptions::default()
        });
        c.add_text("p q r");
        assert!(c.stats().contains("2_3"));
        assert!(!c.stats().contains("1_2_3"));
    }

    #[test]
    fn default_preprocessing_strips_markup() {
        let mut c = collector(CollectorOptions::default());
        assert_eq!(c.add_text("left<br/>right"), 2);
        assert!(!c.stats().contains("1_2"));
    }

    #[test]
    fn clear_resets_both_cache_and_table() {
        let mut c = collector(CollectorOptions::default());
        c.add_text("one two");
        c.clear();
        assert!(c.words().is_empty());
        assert!(c.stats().is_empty());
        c.add_text("fresh");
        assert_eq!(c.words().get_id("fresh"), Some(1));
    }
}
