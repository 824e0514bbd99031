//! Okapi BM25 over a small candidate pool.
//!
//! This is a local re-ranker: document frequencies are computed within
//! the candidate pool only, not the full corpus, because the pool has
//! already been shortlisted by the dense backend or the sparse index.

use std::collections::{HashMap, HashSet};

use crate::tokenize::Tokenizer;

#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Document-length normalization.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// One score per candidate, aligned by index. A candidate with no
/// query-term overlap scores exactly 0.
pub fn bm25_scores(
    query: &str,
    candidates: &[String],
    params: Bm25Params,
    tokenizer: &Tokenizer,
) -> Vec<f32> {
    let pool_size = candidates.len();
    if pool_size == 0 {
        return Vec::new();
    }

    // Unique query terms in first-occurrence order; duplicates are
    // ignored for term iteration but still count toward candidate tf.
    let query_tokens = tokenizer.tokenize(query);
    let mut terms: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for token in &query_tokens {
        if seen.insert(token.as_str()) {
            terms.push(token.clone());
        }
    }
    if terms.is_empty() {
        return vec![0.0; pool_size];
    }

    let doc_tokens: Vec<Vec<String>> = candidates
        .iter()
        .map(|text| tokenizer.tokenize(text))
        .collect();
    let doc_len: Vec<f32> = doc_tokens.iter().map(|tokens| tokens.len() as f32).collect();
    let avgdl = doc_len.iter().sum::<f32>() / pool_size as f32;

    // df and idf within the pool
    let mut idf: Vec<f32> = Vec::with_capacity(terms.len());
    for term in &terms {
        let df = doc_tokens
            .iter()
            .filter(|tokens| tokens.iter().any(|t| t == term))
            .count() as f32;
        let n = pool_size as f32;
        idf.push(((n - df + 0.5) / (df + 0.5) + 1.0).ln());
    }

    let mut scores = Vec::with_capacity(pool_size);
    for (position, tokens) in doc_tokens.iter().enumerate() {
        let mut tf: HashMap<&str, f32> = HashMap::new();
        for token in tokens {
            *tf.entry(token.as_str()).or_insert(0.0) += 1.0;
        }
        let length_norm = 1.0 - params.b + params.b * (doc_len[position] / avgdl.max(1e-9));
        let mut score = 0.0f32;
        for (term, &term_idf) in terms.iter().zip(&idf) {
            let Some(&frequency) = tf.get(term.as_str()) else {
                continue;
            };
            score += term_idf * (frequency * (params.k1 + 1.0))
                / (frequency + params.k1 * length_norm);
        }
        scores.push(score);
    }
    scores
}
