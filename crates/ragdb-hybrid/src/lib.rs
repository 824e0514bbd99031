//! ragdb-hybrid
//!
//! Score fusion and the multi-partition aggregator that turns a query
//! into one ranked list of passages across the lexical and dense
//! sources.

pub mod fusion;
pub mod retriever;

pub use fusion::{blend, min_max_normalize};
pub use retriever::HybridRetriever;
