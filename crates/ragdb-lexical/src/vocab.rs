//! Corpus vocabulary: stable token indices, document frequencies and
//! smoothed inverse document frequencies.

use std::collections::{BTreeMap, HashMap, HashSet};

pub struct Vocabulary {
    token_to_index: HashMap<String, u32>,
    idf: Vec<f32>,
    doc_count: usize,
}

impl Vocabulary {
    /// Build from the per-document token lists of the whole corpus.
    ///
    /// Tokens are indexed in sorted order so indices are stable across
    /// rebuilds of the same corpus. `idf(t) = ln((1 + N) / (1 + df(t))) + 1`
    /// is strictly positive for every token that appears at all.
    pub fn build(token_lists: &[Vec<String>]) -> Self {
        let mut df: BTreeMap<&str, u32> = BTreeMap::new();
        for tokens in token_lists {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for token in unique {
                *df.entry(token).or_insert(0) += 1;
            }
        }

        let doc_count = token_lists.len();
        let mut token_to_index = HashMap::with_capacity(df.len());
        let mut idf = Vec::with_capacity(df.len());
        for (index, (token, frequency)) in df.iter().enumerate() {
            token_to_index.insert((*token).to_string(), index as u32);
            idf.push(((1 + doc_count) as f32 / (1 + frequency) as f32).ln() + 1.0);
        }

        Self {
            token_to_index,
            idf,
            doc_count,
        }
    }

    pub fn index_of(&self, token: &str) -> Option<u32> {
        self.token_to_index.get(token).copied()
    }

    pub fn idf(&self, index: u32) -> f32 {
        self.idf[index as usize]
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }
}
