//! ragdb-lexical
//!
//! The locally computable half of hybrid retrieval: tokenization, the
//! TF-IDF sparse index with cosine search, and the BM25 candidate-pool
//! re-ranker.

pub mod bm25;
pub mod index;
pub mod tokenize;
pub mod vocab;

pub use bm25::{bm25_scores, Bm25Params};
pub use index::{LexicalHit, SparseVector, TfIdfIndex};
pub use tokenize::{Lemmatizer, Tokenizer};
pub use vocab::Vocabulary;
