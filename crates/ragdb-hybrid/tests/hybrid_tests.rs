use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use ragdb_core::config::RetrievalConfig;
use ragdb_core::traits::{DenseBackend, Embedder};
use ragdb_core::types::{DenseHit, Document, SearchMode};
use ragdb_hybrid::{blend, min_max_normalize, HybridRetriever};
use ragdb_lexical::{TfIdfIndex, Tokenizer};

struct MockEmbedder {
    last_query: Mutex<String>,
}

impl MockEmbedder {
    fn new() -> Self {
        Self {
            last_query: Mutex::new(String::new()),
        }
    }
}

impl Embedder for MockEmbedder {
    fn dim(&self) -> usize {
        3
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if let Some(text) = texts.first() {
            *self.last_query.lock().expect("lock") = text.clone();
        }
        Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
    }
}

#[derive(Default)]
struct MockDense {
    hits: HashMap<String, Vec<DenseHit>>,
    failing: Vec<String>,
    delay: Option<(String, Duration)>,
}

impl MockDense {
    fn with_hits(mut self, partition: &str, hits: Vec<DenseHit>) -> Self {
        self.hits.insert(partition.to_string(), hits);
        self
    }

    fn with_failure(mut self, partition: &str) -> Self {
        self.failing.push(partition.to_string());
        self
    }

    fn with_delay(mut self, partition: &str, delay: Duration) -> Self {
        self.delay = Some((partition.to_string(), delay));
        self
    }
}

#[async_trait]
impl DenseBackend for MockDense {
    async fn search(
        &self,
        partition: &str,
        _query: &[f32],
        limit: usize,
    ) -> anyhow::Result<Vec<DenseHit>> {
        if let Some((slow, delay)) = &self.delay {
            if slow == partition {
                tokio::time::sleep(*delay).await;
            }
        }
        if self.failing.iter().any(|p| p == partition) {
            anyhow::bail!("connection refused");
        }
        let mut hits = self.hits.get(partition).cloned().unwrap_or_default();
        hits.truncate(limit);
        Ok(hits)
    }
}

fn hit(id: &str, score: f32, text: &str) -> DenseHit {
    DenseHit {
        id: id.to_string(),
        score,
        payload: json!({"id": id, "text": text}),
    }
}

fn russian_index() -> Arc<TfIdfIndex> {
    let corpus = vec![
        Document {
            id: "d1".to_string(),
            partition: "kb".to_string(),
            text: "кот сидит на окне".to_string(),
        },
        Document {
            id: "d2".to_string(),
            partition: "kb".to_string(),
            text: "собака бежит по двору".to_string(),
        },
        Document {
            id: "d3".to_string(),
            partition: "kb".to_string(),
            text: "кот и собака играют".to_string(),
        },
    ];
    Arc::new(TfIdfIndex::build(corpus, Arc::new(Tokenizer::new())).expect("index"))
}

fn config(alpha: f32) -> RetrievalConfig {
    RetrievalConfig {
        alpha,
        dense_timeout_ms: 50,
        ..RetrievalConfig::default()
    }
}

#[test]
fn normalize_examples_from_the_contract() {
    assert_eq!(min_max_normalize(&[5.0, 5.0, 5.0]), vec![0.0, 0.0, 0.0]);
    assert_eq!(min_max_normalize(&[1.0, 3.0, 5.0]), vec![0.0, 0.5, 1.0]);
    assert_eq!(min_max_normalize(&[]), Vec::<f32>::new());
    assert_eq!(min_max_normalize(&[0.7]), vec![0.0]);

    let normalized = min_max_normalize(&[-2.0, 0.0, 6.0]);
    assert!(normalized.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn blend_collapses_exactly_at_the_endpoints() {
    let semantic = [0.0, 0.25, 1.0];
    let lexical = [0.5, 0.75, 0.125];
    assert_eq!(blend(&semantic, &lexical, 1.0), semantic.to_vec());
    assert_eq!(blend(&semantic, &lexical, 0.0), lexical.to_vec());
    // out-of-range weights clamp before use
    assert_eq!(blend(&semantic, &lexical, 7.0), semantic.to_vec());
    assert_eq!(blend(&semantic, &lexical, -1.0), lexical.to_vec());

    let mixed = blend(&semantic, &lexical, 0.6);
    assert!((mixed[1] - (0.6 * 0.25 + 0.4 * 0.75)).abs() < 1e-6);
}

#[tokio::test]
async fn failed_partition_degrades_to_remaining_sources() {
    let backend = MockDense::default()
        .with_hits(
            "rooms",
            vec![
                hit("r1", 0.9, "Standard room with a view"),
                hit("r2", 0.5, "Family suite"),
            ],
        )
        .with_failure("faq");
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6))
        .with_dense(Arc::new(backend), Arc::new(MockEmbedder::new()));

    let response = retriever
        .search("room", &["rooms".to_string(), "faq".to_string()], 10)
        .await
        .expect("search succeeds despite the failed partition");

    assert_eq!(response.mode, SearchMode::Hybrid);
    assert_eq!(response.passages.len(), 2);
    assert!(response.passages.iter().all(|p| p.partition == "rooms"));
    assert_eq!(response.passages[0].text, "Standard room with a view");
}

#[tokio::test]
async fn timed_out_partition_is_skipped() {
    let backend = MockDense::default()
        .with_hits("fast", vec![hit("f1", 0.8, "fast answer")])
        .with_hits("slow", vec![hit("s1", 0.9, "slow answer")])
        .with_delay("slow", Duration::from_millis(300));
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6))
        .with_dense(Arc::new(backend), Arc::new(MockEmbedder::new()));

    let response = retriever
        .search("answer", &["fast".to_string(), "slow".to_string()], 10)
        .await
        .expect("search");

    assert_eq!(response.passages.len(), 1);
    assert_eq!(response.passages[0].partition, "fast");
}

#[tokio::test]
async fn equal_semantic_scores_tie_break_by_id() {
    // identical backend scores for every candidate: normalization is
    // degenerate, alpha = 1 keeps the blend degenerate, so ordering
    // falls back to id order
    let backend = MockDense::default().with_hits(
        "kb",
        vec![
            hit("d3", 0.5, "кот и собака играют"),
            hit("d1", 0.5, "кот сидит на окне"),
            hit("d2", 0.5, "собака бежит по двору"),
        ],
    );
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(1.0))
        .with_dense(Arc::new(backend), Arc::new(MockEmbedder::new()));

    let response = retriever
        .search("кот", &["kb".to_string()], 10)
        .await
        .expect("search");

    assert_eq!(response.mode, SearchMode::Semantic);
    let texts: Vec<&str> = response.passages.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "кот сидит на окне",
            "собака бежит по двору",
            "кот и собака играют",
        ]
    );
    assert!(response.passages.iter().all(|p| p.score == 0.0));
}

#[tokio::test]
async fn hybrid_blend_prefers_lexical_overlap_at_low_alpha() {
    let backend = MockDense::default().with_hits(
        "kb",
        vec![
            hit("a", 0.9, "собака бежит по двору"),
            hit("b", 0.6, "кот сидит на окне"),
        ],
    );
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.2))
        .with_dense(Arc::new(backend), Arc::new(MockEmbedder::new()));

    let response = retriever
        .search("кот", &["kb".to_string()], 10)
        .await
        .expect("search");

    assert_eq!(response.mode, SearchMode::Hybrid);
    // BM25 overlap on "кот" outweighs the higher raw semantic score
    assert_eq!(response.passages[0].text, "кот сидит на окне");
    for passage in &response.passages {
        assert!((0.0..=1.0).contains(&passage.score));
    }
}

#[tokio::test]
async fn repeated_same_source_hits_are_deduplicated() {
    let backend = MockDense::default().with_hits(
        "kb",
        vec![
            hit("dup", 0.4, "first copy"),
            hit("dup", 0.8, "second copy"),
            hit("other", 0.6, "another passage"),
        ],
    );
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6))
        .with_dense(Arc::new(backend), Arc::new(MockEmbedder::new()));

    let response = retriever
        .search("passage", &["kb".to_string()], 10)
        .await
        .expect("search");

    assert_eq!(response.passages.len(), 2, "exact (partition, id) repeats collapse");
}

#[tokio::test]
async fn payloads_without_text_are_dropped() {
    let backend = MockDense::default().with_hits(
        "kb",
        vec![
            DenseHit {
                id: "empty".to_string(),
                score: 0.99,
                payload: json!({"id": "empty", "category": "misc"}),
            },
            hit("ok", 0.5, "usable text"),
        ],
    );
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6))
        .with_dense(Arc::new(backend), Arc::new(MockEmbedder::new()));

    let response = retriever
        .search("text", &["kb".to_string()], 10)
        .await
        .expect("search");

    assert_eq!(response.passages.len(), 1);
    assert_eq!(response.passages[0].text, "usable text");
}

#[tokio::test]
async fn lexical_only_mode_keeps_native_scores() {
    let index = russian_index();
    let retriever =
        HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6)).with_lexical(index.clone());

    let response = retriever
        .search("кот", &["kb".to_string()], 10)
        .await
        .expect("search");

    assert_eq!(response.mode, SearchMode::Lexical);
    let direct = index.search("кот", Some("kb"), 10);
    assert_eq!(response.passages.len(), direct.len());
    for (passage, hit) in response.passages.iter().zip(&direct) {
        assert_eq!(passage.score, hit.score, "native cosine scale, not blended");
        assert_eq!(passage.text, index.document(hit.doc).text);
    }
}

#[tokio::test]
async fn dense_failure_falls_back_to_lexical_mode() {
    let backend = MockDense::default().with_failure("kb");
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6))
        .with_lexical(russian_index())
        .with_dense(Arc::new(backend), Arc::new(MockEmbedder::new()));

    let response = retriever
        .search("кот", &["kb".to_string()], 2)
        .await
        .expect("search");

    assert_eq!(response.mode, SearchMode::Lexical);
    assert_eq!(response.passages.len(), 2, "limit respected");
}

#[tokio::test]
async fn query_prefix_is_applied_before_embedding() {
    let embedder = Arc::new(MockEmbedder::new());
    let backend = MockDense::default().with_hits("kb", vec![hit("x", 0.5, "text")]);
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6))
        .with_dense(Arc::new(backend), embedder.clone());

    retriever
        .search("  когда заезд?  ", &["kb".to_string()], 5)
        .await
        .expect("search");

    assert_eq!(
        embedder.last_query.lock().expect("lock").as_str(),
        "query: когда заезд?"
    );
}

#[tokio::test]
async fn empty_pools_yield_empty_ok_responses() {
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6))
        .with_lexical(russian_index());

    let response = retriever
        .search("бассейн", &["kb".to_string()], 5)
        .await
        .expect("no candidates is not an error");
    assert!(response.passages.is_empty());

    let response = retriever
        .search("кот", &[], 5)
        .await
        .expect("no partitions is not an error");
    assert!(response.passages.is_empty());
}

#[tokio::test]
async fn repeated_searches_are_deterministic() {
    let backend = Arc::new(MockDense::default().with_hits(
        "kb",
        vec![
            hit("a", 0.9, "кот сидит на окне"),
            hit("b", 0.7, "собака бежит по двору"),
            hit("c", 0.7, "кот и собака играют"),
        ],
    ));
    let retriever = HybridRetriever::new(Arc::new(Tokenizer::new()), config(0.6))
        .with_lexical(russian_index())
        .with_dense(backend, Arc::new(MockEmbedder::new()));

    let first = retriever
        .search("кот", &["kb".to_string()], 10)
        .await
        .expect("search");
    let second = retriever
        .search("кот", &["kb".to_string()], 10)
        .await
        .expect("search");

    assert_eq!(first.mode, second.mode);
    assert_eq!(first.passages.len(), second.passages.len());
    for (x, y) in first.passages.iter().zip(&second.passages) {
        assert_eq!(x.partition, y.partition);
        assert_eq!(x.score, y.score);
        assert_eq!(x.text, y.text);
    }
}
