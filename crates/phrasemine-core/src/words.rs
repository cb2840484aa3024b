//! Word interning cache.
//!
//! Maps each distinct token to a stable numeric id. Ids are assigned
//! monotonically from 1, never reused, and reset only by [`WordCache::clear`].
//! Equality is decided on a normalized key; the spelling from the first
//! sighting is kept as the display form.
//!
//! There is no process-global cache: every job constructs and injects its
//! own instance, and clears it explicitly between independent jobs.

use std::collections::HashMap;

/// Stable identifier assigned to a normalized word.
pub type WordId = u64;

/// Normalization hook applied before lookup and insertion.
pub type Normalizer = Box<dyn Fn(&str) -> String>;

/// Hook producing alternative spellings folded onto a freshly assigned id.
pub type SynonymProvider = Box<dyn Fn(&str) -> Vec<String>>;

/// Default normalizer: trim, lowercase, fold `ё` to `е`.
///
/// The `ё` fold matches Russian orthographic practice where the two letters
/// are interchangeable in running text.
pub fn normalize_default(word: &str) -> String {
    word.trim().to_lowercase().replace('ё', "е")
}

/// Interning cache for words seen during one mining job.
pub struct WordCache {
    id_to_surface: HashMap<WordId, String>,
    key_to_id: HashMap<String, WordId>,
    next_id: WordId,
    normalize: Option<Normalizer>,
    synonyms: Option<SynonymProvider>,
}

impl Default for WordCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WordCache {
    /// Creates a cache with the default normalizer and no synonym folding.
    pub fn new() -> Self {
        Self::with_hooks(Some(Box::new(|w| normalize_default(w))), None)
    }

    /// Creates a cache with explicit hooks; `None` disables the step.
    pub fn with_hooks(normalize: Option<Normalizer>, synonyms: Option<SynonymProvider>) -> Self {
        Self {
            id_to_surface: HashMap::new(),
            key_to_id: HashMap::new(),
            next_id: 1,
            normalize,
            synonyms,
        }
    }

    /// The normalized lookup key for `word`.
    pub fn normalize_key(&self, word: &str) -> String {
        match &self.normalize {
            Some(f) => f(word),
            None => word.to_string(),
        }
    }

    /// Interns `word`, returning the existing id when its normalized key is
    /// already known.
    ///
    /// On first sighting the surface form is recorded and any synonym keys
    /// are folded onto the new id. A synonym key that already maps to some
    /// id keeps its mapping: folding must not re-key previously interned
    /// words.
    pub fn put(&mut self, word: &str) -> WordId {
        let key = self.normalize_key(word);
        if let Some(&id) = self.key_to_id.get(&key) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.key_to_id.insert(key.clone(), id);
        self.id_to_surface.insert(id, word.to_string());
        if let Some(provider) = &self.synonyms {
            for synonym in provider(&key) {
                let synonym_key = match &self.normalize {
                    Some(f) => f(&synonym),
                    None => synonym,
                };
                self.key_to_id.entry(synonym_key).or_insert(id);
            }
        }
        id
    }

    /// First-seen spelling for `id`, if assigned.
    pub fn get(&self, id: WordId) -> Option<&str> {
        self.id_to_surface.get(&id).map(String::as_str)
    }

    /// Id for `word` without interning it. Absence is not an error.
    pub fn get_id(&self, word: &str) -> Option<WordId> {
        self.key_to_id.get(&self.normalize_key(word)).copied()
    }

    /// Number of distinct interned words.
    pub fn len(&self) -> usize {
        self.id_to_surface.len()
    }

    /// `true` when nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.id_to_surface.is_empty()
    }

    /// Drops every entry and restarts id assignment from 1.
    pub fn clear(&mut self) {
        self.id_to_surface.clear();
        self.key_to_id.clear();
        self.next_id = 1;
    }
}
