//! Tokenizer/segmenter.
//!
//! Splits raw text into phrase-worthy runs and, within each run, into
//! individual words. Both matchers derive from three configurable character
//! classes: *letters* (what words are made of), *joiners* (characters such
//! as apostrophes and hyphens allowed inside a word when flanked by letters)
//! and *separators* (what may sit between the words of one phrase).
//!
//! Identical text and identical rules always yield an identical ordered id
//! sequence.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TokenizeResult;
use crate::words::{WordCache, WordId};

/// Character classes the tokenizer is built from.
///
/// Each field is the body of a regex character class (no surrounding
/// brackets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenRules {
    /// Characters a word is made of.
    pub letters: String,
    /// Characters allowed inside a word when flanked by letters on both
    /// sides.
    pub joiners: String,
    /// Characters that may separate consecutive words of one phrase.
    pub separators: String,
}

impl Default for TokenRules {
    fn default() -> Self {
        Self {
            letters: "a-zA-Zа-яА-ЯёЁ".to_string(),
            joiners: "'_-".to_string(),
            separators: " \\t'-".to_string(),
        }
    }
}

impl TokenRules {
    /// Pattern matching one maximal word.
    fn word_pattern(&self) -> String {
        format!(
            "[{letters}]+(?:[{joiners}][{letters}]+)*",
            letters = self.letters,
            joiners = self.joiners,
        )
    }

    /// Pattern matching one phrase run: words separated by short separator
    /// runs.
    fn phrase_pattern(&self) -> String {
        let word = self.word_pattern();
        format!("{word}(?:[{separators}]+{word})*", separators = self.separators)
    }
}

/// Compiled word and phrase matchers for one rule set.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    word_re: Regex,
    phrase_re: Regex,
}

impl Tokenizer {
    /// Compiles the matchers for `rules`.
    pub fn new(rules: &TokenRules) -> TokenizeResult<Self> {
        let word_re = Regex::new(&rules.word_pattern())?;
        let phrase_re = Regex::new(&rules.phrase_pattern())?;
        Ok(Self { word_re, phrase_re })
    }

    /// Lazily yields the phrase substrings of `text`, in order.
    pub fn phrases<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> {
        self.phrase_re.find_iter(text).map(|m| m.as_str())
    }

    /// Lazily yields the words of one phrase substring, in order.
    pub fn words<'t>(&self, phrase: &'t str) -> impl Iterator<Item = &'t str> {
        self.word_re.find_iter(phrase).map(|m| m.as_str())
    }

    /// Interns every word of `phrase` and returns the ordered id sequence.
    pub fn word_ids(&self, phrase: &str, cache: &mut WordCache) -> Vec<WordId> {
        self.words(phrase).map(|w| cache.put(w)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(&TokenRules::default()).unwrap()
    }

    #[test]
    fn phrases_break_on_line_ends() {
        let t = tokenizer();
        let phrases: Vec<_> = t.phrases("one two\r\nthree four").collect();
        assert_eq!(phrases, vec!["one two", "three four"]);
    }

    #[test]
    fn separator_runs_stay_inside_one_phrase() {
        let t = tokenizer();
        let phrases: Vec<_> = t.phrases("alpha - beta   gamma").collect();
        assert_eq!(phrases, vec!["alpha - beta   gamma"]);
        let words: Vec<_> = t.words(phrases[0]).collect();
        assert_eq!(words, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn joiners_need_letters_on_both_sides() {
        let t = tokenizer();
        let words: Vec<_> = t.words("Word's-B -trailing- 'quoted'").collect();
        assert_eq!(words, vec!["Word's-B", "trailing", "quoted"]);
    }

    #[test]
    fn leading_and_trailing_separators_are_dropped() {
        let t = tokenizer();
        let phrases: Vec<_> = t.phrases("  - alpha beta  - ").collect();
        assert_eq!(phrases, vec!["alpha beta"]);
    }

    #[test]
    fn identical_input_yields_identical_id_sequences() {
        let text = "Déjà vu? the CAT the cat the Cat";
        let ids_a = {
            let t = tokenizer();
            let mut cache = WordCache::new();
            t.phrases(text)
                .flat_map(|p| t.word_ids(p, &mut cache))
                .collect::<Vec<_>>()
        };
        let ids_b = {
            let t = tokenizer();
            let mut cache = WordCache::new();
            t.phrases(text)
                .flat_map(|p| t.word_ids(p, &mut cache))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn custom_letter_class() {
        let rules = TokenRules {
            letters: "0-9".to_string(),
            joiners: ".".to_string(),
            separators: " ".to_string(),
        };
        let t = Tokenizer::new(&rules).unwrap();
        let words: Vec<_> = t.words("3.14 abc 42").collect();
        assert_eq!(words, vec!["3.14", "42"]);
    }

    #[test]
    fn invalid_class_body_is_an_error() {
        let rules = TokenRules {
            letters: "z-a".to_string(),
            ..TokenRules::default()
        };
        assert!(Tokenizer::new(&rules).is_err());
    }
}
