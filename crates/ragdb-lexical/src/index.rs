//! TF-IDF sparse index with cosine search.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{info, warn};

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::Embedder;
use ragdb_core::types::Document;

use crate::tokenize::Tokenizer;
use crate::vocab::Vocabulary;

/// Sparse TF-IDF weights for one document or query.
///
/// Weights are kept as index-sorted pairs; a weight of exactly 0.0 is
/// never stored, and the L2 norm is computed when the weights are built.
/// The sorted representation makes the cosine merge-join deterministic,
/// so `q.cosine(d) == d.cosine(q)` holds bit-for-bit.
#[derive(Debug, Clone)]
pub struct SparseVector {
    weights: Vec<(u32, f32)>,
    norm: f32,
}

impl SparseVector {
    pub fn norm(&self) -> f32 {
        self.norm
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Cosine similarity; 0.0 when either norm is zero, never NaN.
    /// Negative dot products are clipped to 0 for ranking purposes.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        let mut dot = 0.0f32;
        let (a, b) = (&self.weights, &other.weights);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        if dot <= 0.0 {
            0.0
        } else {
            dot / (self.norm * other.norm)
        }
    }
}

/// A hit from the local sparse index: position into the index's
/// document table plus the raw cosine score.
#[derive(Debug, Clone, Copy)]
pub struct LexicalHit {
    pub doc: usize,
    pub score: f32,
}

/// The immutable TF-IDF index over one knowledge-base snapshot.
///
/// Construction is the only mutation; once built, the vocabulary and the
/// per-document vectors are shared read-only across concurrent searches.
/// A rebuild constructs a fresh index from a fresh snapshot.
pub struct TfIdfIndex {
    vocab: Vocabulary,
    documents: Vec<Document>,
    vectors: Vec<SparseVector>,
    partitions: Vec<String>,
    tokenizer: Arc<Tokenizer>,
}

impl TfIdfIndex {
    /// Build the index. Documents with no extractable tokens are skipped
    /// with a warning; an empty remainder is a configuration error.
    pub fn build(documents: Vec<Document>, tokenizer: Arc<Tokenizer>) -> Result<Self> {
        let mut kept = Vec::with_capacity(documents.len());
        let mut token_lists = Vec::with_capacity(documents.len());
        for document in documents {
            let tokens = tokenizer.tokenize(&document.text);
            if tokens.is_empty() {
                warn!(id = %document.id, partition = %document.partition,
                      "document has no indexable tokens, skipping");
                continue;
            }
            kept.push(document);
            token_lists.push(tokens);
        }
        if kept.is_empty() {
            return Err(Error::InvalidConfig(
                "cannot build an index from an empty document set".to_string(),
            ));
        }

        let vocab = Vocabulary::build(&token_lists);
        let vectors = token_lists
            .iter()
            .map(|tokens| encode_tokens(&vocab, tokens))
            .collect();

        let mut partitions: Vec<String> = kept.iter().map(|d| d.partition.clone()).collect();
        partitions.sort();
        partitions.dedup();

        info!(
            documents = kept.len(),
            vocabulary = vocab.len(),
            partitions = partitions.len(),
            "tf-idf index built"
        );

        Ok(Self {
            vocab,
            documents: kept,
            vectors,
            partitions,
            tokenizer,
        })
    }

    /// Encode arbitrary text into the corpus vector space. Tokens absent
    /// from the vocabulary contribute nothing.
    pub fn encode(&self, text: &str) -> SparseVector {
        encode_tokens(&self.vocab, &self.tokenizer.tokenize(text))
    }

    pub fn search(&self, query: &str, partition: Option<&str>, limit: usize) -> Vec<LexicalHit> {
        self.search_encoded(&self.encode(query), partition, limit)
    }

    /// Cosine search against every indexed document, optionally filtered
    /// to one partition. Only strictly positive similarities are kept;
    /// ties are broken by document id for determinism.
    pub fn search_encoded(
        &self,
        query: &SparseVector,
        partition: Option<&str>,
        limit: usize,
    ) -> Vec<LexicalHit> {
        if query.is_empty() || query.norm() == 0.0 {
            return Vec::new();
        }
        let mut hits = Vec::new();
        for (position, (document, vector)) in
            self.documents.iter().zip(&self.vectors).enumerate()
        {
            if let Some(wanted) = partition {
                if document.partition != wanted {
                    continue;
                }
            }
            let score = query.cosine(vector);
            if score > 0.0 {
                hits.push(LexicalHit {
                    doc: position,
                    score,
                });
            }
        }
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.documents[a.doc].id.cmp(&self.documents[b.doc].id))
        });
        hits.truncate(limit);
        hits
    }

    pub fn document(&self, position: usize) -> &Document {
        &self.documents[position]
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Partition names present in the corpus, sorted.
    pub fn partitions(&self) -> &[String] {
        &self.partitions
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    fn densify(&self, sparse: &SparseVector) -> Vec<f32> {
        let mut dense = vec![0.0f32; self.vocab.len()];
        for &(index, weight) in &sparse.weights {
            dense[index as usize] = weight;
        }
        dense
    }
}

/// The index doubles as an embedder: queries and documents are densified
/// sparse vectors of vocabulary dimension, which lets a dense store be
/// filled and searched without any external model.
impl Embedder for TfIdfIndex {
    fn dim(&self) -> usize {
        self.vocab.len()
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.densify(&self.encode(text)))
            .collect())
    }
}

fn encode_tokens(vocab: &Vocabulary, tokens: &[String]) -> SparseVector {
    let total = tokens.len();
    if total == 0 {
        return SparseVector {
            weights: Vec::new(),
            norm: 0.0,
        };
    }

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let mut by_index: BTreeMap<u32, f32> = BTreeMap::new();
    for (token, count) in counts {
        let Some(index) = vocab.index_of(token) else {
            continue;
        };
        let tf = count as f32 / total as f32;
        let weight = tf * vocab.idf(index);
        if weight == 0.0 {
            continue;
        }
        by_index.insert(index, weight);
    }

    // Summing in index order keeps repeated encodes bit-identical.
    let weights: Vec<(u32, f32)> = by_index.into_iter().collect();
    let norm_sq: f32 = weights.iter().map(|&(_, w)| w * w).sum();

    SparseVector {
        weights,
        norm: norm_sq.sqrt(),
    }
}
