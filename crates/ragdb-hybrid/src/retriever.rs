//! Multi-partition hybrid retrieval.
//!
//! Per partition, candidates are pulled from the dense backend (bounded
//! by a timeout, failures skipped) and from the local TF-IDF index. When
//! any dense candidate survives, the whole pool is BM25-rescored, both
//! raw score lists are min-max-normalized over the pool, and the final
//! ranking is the alpha blend. Without dense candidates the local index
//! alone answers, on its native cosine scale.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use ragdb_core::config::RetrievalConfig;
use ragdb_core::extract::extract_text;
use ragdb_core::traits::{DenseBackend, Embedder};
use ragdb_core::types::{DenseHit, RetrievedPassage, SearchMode, SearchResponse};
use ragdb_lexical::{bm25_scores, Bm25Params, TfIdfIndex, Tokenizer};

use crate::fusion::{blend, min_max_normalize};

/// A candidate passage collected from one source for one partition.
#[derive(Debug, Clone)]
struct Candidate {
    partition: String,
    id: String,
    text: String,
    semantic: f32,
}

pub struct HybridRetriever {
    lexical: Option<Arc<TfIdfIndex>>,
    dense: Option<Arc<dyn DenseBackend>>,
    embedder: Option<Arc<dyn Embedder>>,
    tokenizer: Arc<Tokenizer>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(tokenizer: Arc<Tokenizer>, config: RetrievalConfig) -> Self {
        Self {
            lexical: None,
            dense: None,
            embedder: None,
            tokenizer,
            config: config.clamped(),
        }
    }

    pub fn with_lexical(mut self, index: Arc<TfIdfIndex>) -> Self {
        self.lexical = Some(index);
        self
    }

    pub fn with_dense(mut self, backend: Arc<dyn DenseBackend>, embedder: Arc<dyn Embedder>) -> Self {
        self.dense = Some(backend);
        self.embedder = Some(embedder);
        self
    }

    /// Search with the configured per-source pool size.
    pub async fn search(
        &self,
        query: &str,
        partitions: &[String],
        limit: usize,
    ) -> anyhow::Result<SearchResponse> {
        self.search_with_pool(query, partitions, limit, self.config.topk_per_source)
            .await
    }

    /// Search with an explicit per-source, per-partition pool size.
    pub async fn search_with_pool(
        &self,
        query: &str,
        partitions: &[String],
        limit: usize,
        topk_per_source: usize,
    ) -> anyhow::Result<SearchResponse> {
        let mut dense_candidates = self.collect_dense(query, partitions, topk_per_source).await;
        dedup_same_source(&mut dense_candidates);
        let lexical_candidates = self.collect_lexical(query, partitions, topk_per_source);

        if dense_candidates.is_empty() && lexical_candidates.is_empty() {
            return Ok(SearchResponse {
                mode: self.idle_mode(),
                passages: Vec::new(),
            });
        }

        if dense_candidates.is_empty() {
            // Lexical-only: native cosine scale, no blending.
            let mut pool = lexical_candidates;
            rank_native(&mut pool);
            pool.truncate(limit);
            return Ok(SearchResponse {
                mode: SearchMode::Lexical,
                passages: into_passages(pool),
            });
        }

        let mut pool = dense_candidates;
        pool.extend(lexical_candidates);

        let texts: Vec<String> = pool.iter().map(|c| c.text.clone()).collect();
        let lexical_raw = bm25_scores(
            query,
            &texts,
            Bm25Params {
                k1: self.config.k1,
                b: self.config.b,
            },
            &self.tokenizer,
        );
        let semantic_raw: Vec<f32> = pool.iter().map(|c| c.semantic).collect();

        let semantic_norm = min_max_normalize(&semantic_raw);
        let lexical_norm = min_max_normalize(&lexical_raw);
        let blended = blend(&semantic_norm, &lexical_norm, self.config.alpha);

        let mut order: Vec<usize> = (0..pool.len()).collect();
        order.sort_by(|&a, &b| {
            blended[b]
                .partial_cmp(&blended[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    (pool[a].partition.as_str(), pool[a].id.as_str())
                        .cmp(&(pool[b].partition.as_str(), pool[b].id.as_str()))
                })
        });
        order.truncate(limit);

        let mode = if self.config.alpha >= 1.0 {
            SearchMode::Semantic
        } else {
            SearchMode::Hybrid
        };
        let passages = order
            .into_iter()
            .map(|position| RetrievedPassage {
                partition: pool[position].partition.clone(),
                score: blended[position],
                text: pool[position].text.clone(),
            })
            .collect();

        Ok(SearchResponse { mode, passages })
    }

    async fn collect_dense(
        &self,
        query: &str,
        partitions: &[String],
        topk_per_source: usize,
    ) -> Vec<Candidate> {
        let (Some(backend), Some(embedder)) = (&self.dense, &self.embedder) else {
            return Vec::new();
        };

        let prepared = format!("{}{}", self.config.query_prefix, query.trim());
        let vector = match embedder.embed(&prepared) {
            Ok(vector) => vector,
            Err(error) => {
                warn!(%error, "query embedding failed, dense sources skipped");
                return Vec::new();
            }
        };

        let timeout = Duration::from_millis(self.config.dense_timeout_ms);
        let mut candidates = Vec::new();
        for partition in partitions {
            let call = backend.search(partition, &vector, topk_per_source);
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(hits)) => {
                    debug!(partition = %partition, hits = hits.len(), "dense partition answered");
                    candidates.extend(hits.into_iter().filter_map(|hit| {
                        dense_hit_to_candidate(partition, hit)
                    }));
                }
                Ok(Err(error)) => {
                    warn!(partition = %partition, %error,
                          "dense backend failed, skipping partition");
                }
                Err(_) => {
                    warn!(partition = %partition, timeout_ms = self.config.dense_timeout_ms,
                          "dense backend timed out, skipping partition");
                }
            }
        }
        candidates
    }

    fn collect_lexical(
        &self,
        query: &str,
        partitions: &[String],
        topk_per_source: usize,
    ) -> Vec<Candidate> {
        let Some(index) = &self.lexical else {
            return Vec::new();
        };
        let encoded = index.encode(query);
        let mut candidates = Vec::new();
        for partition in partitions {
            for hit in index.search_encoded(&encoded, Some(partition), topk_per_source) {
                let document = index.document(hit.doc);
                candidates.push(Candidate {
                    partition: document.partition.clone(),
                    id: document.id.clone(),
                    text: document.text.clone(),
                    semantic: hit.score,
                });
            }
        }
        candidates
    }

    /// Mode tag for an empty response, derived from the configuration.
    fn idle_mode(&self) -> SearchMode {
        if self.dense.is_none() {
            SearchMode::Lexical
        } else if self.config.alpha >= 1.0 {
            SearchMode::Semantic
        } else {
            SearchMode::Hybrid
        }
    }
}

fn dense_hit_to_candidate(partition: &str, hit: DenseHit) -> Option<Candidate> {
    // Payloads without extractable text are dropped, not failed.
    let text = extract_text(&hit.payload)?;
    Some(Candidate {
        partition: partition.to_string(),
        id: hit.id,
        text,
        semantic: hit.score,
    })
}

/// Collapse exact `(partition, id)` repeats from the same source,
/// keeping the better raw score. Candidates from different partitions
/// are never merged, even with identical text.
fn dedup_same_source(candidates: &mut Vec<Candidate>) {
    let mut best: HashMap<(String, String), Candidate> = HashMap::new();
    for candidate in candidates.drain(..) {
        let key = (candidate.partition.clone(), candidate.id.clone());
        match best.entry(key) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                if candidate.semantic > slot.get().semantic {
                    slot.insert(candidate);
                }
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
        }
    }
    let mut deduped: Vec<Candidate> = best.into_values().collect();
    deduped.sort_by(|a, b| (a.partition.as_str(), a.id.as_str()).cmp(&(b.partition.as_str(), b.id.as_str())));
    *candidates = deduped;
}

fn rank_native(pool: &mut [Candidate]) {
    pool.sort_by(|a, b| {
        b.semantic
            .partial_cmp(&a.semantic)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.partition.as_str(), a.id.as_str()).cmp(&(b.partition.as_str(), b.id.as_str())))
    });
}

fn into_passages(pool: Vec<Candidate>) -> Vec<RetrievedPassage> {
    pool.into_iter()
        .map(|candidate| RetrievedPassage {
            partition: candidate.partition,
            score: candidate.semantic,
            text: candidate.text,
        })
        .collect()
}
