//! Finalized table rendering.
//!
//! Downstream consumers (report writers, catalog cross-referencers) read
//! the reduced table as ordered `(key, record)` pairs via
//! [`crate::stats::PhraseStats::entries`]; this module supplies the decode
//! side — key back to display text — and the engine's interchange
//! serialization.

use crate::key;
use crate::stats::PhraseStats;
use crate::words::WordCache;

/// Decodes a phrase key into display text: the surface forms of its words
/// joined by single spaces.
///
/// Returns `None` when the key is malformed or names an id the cache does
/// not know (e.g. after `clear`).
pub fn phrase_text(cache: &WordCache, phrase_key: &str) -> Option<String> {
    let ids = key::decode(phrase_key)?;
    let mut text = String::new();
    for id in ids {
        let word = cache.get(id)?;
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(word);
    }
    Some(text)
}

/// Renders the table in the engine's interchange form: `count`, TAB,
/// phrase text; one line per record, CRLF-joined, in table order.
///
/// Multi-word phrases seen exactly once are omitted: a singleton
/// combination carries no frequency signal, only its words do.
pub fn render_tsv(cache: &WordCache, stats: &PhraseStats) -> String {
    let mut out = String::new();
    for (phrase_key, record) in stats.entries() {
        if record.count == 1 && record.words_count > 1 {
            continue;
        }
        let Some(phrase) = phrase_text(cache, phrase_key) else {
            continue;
        };
        if !out.is_empty() {
            out.push_str("\r\n");
        }
        out.push_str(&record.count.to_string());
        out.push('\t');
        out.push_str(&phrase);
    }
    out
}
