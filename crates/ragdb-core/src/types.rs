//! Domain types shared by the lexical index, the dense backend and the
//! aggregator.

use serde::{Deserialize, Serialize};

pub type DocumentId = String;

/// One indexed passage of the knowledge base.
///
/// Built once per snapshot load, never mutated; a rebuild replaces the
/// whole set. `text` is the exact string that is scored and returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub partition: String,
    pub text: String,
}

/// Which pipeline produced a search response.
///
/// `Lexical` responses carry native cosine scores; `Semantic` and
/// `Hybrid` responses carry blended scores in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Lexical,
    Semantic,
    Hybrid,
}

/// One ranked passage handed to the context-assembly layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub partition: String,
    pub score: f32,
    pub text: String,
}

/// The full result of one retrieval call, ordered descending by score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub mode: SearchMode,
    pub passages: Vec<RetrievedPassage>,
}

/// A nearest-neighbour hit as returned by a dense backend. The payload
/// is opaque; text is recovered through the extraction fallback rules.
#[derive(Debug, Clone)]
pub struct DenseHit {
    pub id: String,
    pub score: f32,
    pub payload: serde_json::Value,
}
