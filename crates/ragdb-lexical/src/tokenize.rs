//! Tokenization shared by the TF-IDF index and the BM25 re-ranker.
//!
//! Lowercases, folds `ё` to `е`, and splits on the fixed word pattern
//! (runs of latin letters, cyrillic letters and digits); everything else
//! is discarded. An optional per-word [`Lemmatizer`] can be injected;
//! its results go through a size-capped cache that is cleared on
//! overflow, never an unbounded map.

use std::collections::HashMap;
use std::sync::Mutex;

/// Per-word normalizer, e.g. a morphological lemmatizer.
pub trait Lemmatizer: Send + Sync {
    fn lemma(&self, word: &str) -> String;
}

const LEMMA_CACHE_CAPACITY: usize = 50_000;

pub struct Tokenizer {
    lemmatizer: Option<Box<dyn Lemmatizer>>,
    cache_capacity: usize,
    cache: Mutex<HashMap<String, String>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            lemmatizer: None,
            cache_capacity: LEMMA_CACHE_CAPACITY,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_lemmatizer(lemmatizer: Box<dyn Lemmatizer>) -> Self {
        Self::with_lemmatizer_and_capacity(lemmatizer, LEMMA_CACHE_CAPACITY)
    }

    pub fn with_lemmatizer_and_capacity(
        lemmatizer: Box<dyn Lemmatizer>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            lemmatizer: Some(lemmatizer),
            cache_capacity,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        for ch in text.chars().flat_map(char::to_lowercase) {
            let ch = if ch == 'ё' { 'е' } else { ch };
            if is_word_char(ch) {
                current.push(ch);
            } else if !current.is_empty() {
                tokens.push(self.normalize(std::mem::take(&mut current)));
            }
        }
        if !current.is_empty() {
            tokens.push(self.normalize(current));
        }
        tokens
    }

    /// Words currently held by the lemma cache.
    pub fn cached_lemmas(&self) -> usize {
        self.cache.lock().expect("lemma cache lock").len()
    }

    fn normalize(&self, word: String) -> String {
        let Some(lemmatizer) = &self.lemmatizer else {
            return word;
        };
        let mut cache = self.cache.lock().expect("lemma cache lock");
        if let Some(hit) = cache.get(&word) {
            return hit.clone();
        }
        let lemma = lemmatizer.lemma(&word);
        if cache.len() >= self.cache_capacity {
            cache.clear();
        }
        cache.insert(word, lemma.clone());
        lemma
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ('а'..='я').contains(&ch)
}
