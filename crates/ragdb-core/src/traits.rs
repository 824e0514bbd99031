use async_trait::async_trait;

use crate::types::DenseHit;

/// Produces dense embeddings for queries and documents.
///
/// Real deployments inject a model-backed implementation; in-tree the
/// TF-IDF index densifies its sparse vectors to satisfy this trait.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let batch = [text.to_string()];
        self.embed_batch(&batch)?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// An opaque nearest-neighbour store queried per partition.
///
/// Errors are per-partition: the aggregator treats a failed call as an
/// empty result for that partition, never as a fatal error.
#[async_trait]
pub trait DenseBackend: Send + Sync {
    async fn search(
        &self,
        partition: &str,
        query: &[f32],
        limit: usize,
    ) -> anyhow::Result<Vec<DenseHit>>;
}
