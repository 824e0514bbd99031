//! Vector search against per-partition Lance tables.

use std::path::Path;

use anyhow::{anyhow, Result};
use arrow_array::{Float32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use serde_json::json;

use ragdb_core::traits::DenseBackend;
use ragdb_core::types::DenseHit;

pub struct LanceDenseBackend {
    db: Connection,
}

impl LanceDenseBackend {
    pub async fn connect(db_path: &Path) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl DenseBackend for LanceDenseBackend {
    /// A missing table or an unreachable store surfaces as `Err`; the
    /// aggregator downgrades that to an empty partition.
    async fn search(
        &self,
        partition: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<DenseHit>> {
        let table = self.db.open_table(partition).execute().await?;
        let mut stream = table
            .vector_search(query.to_vec())?
            .limit(limit)
            .execute()
            .await?;

        let mut hits = Vec::new();
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
            for row in 0..batch.num_rows() {
                let id = string_value(&batch, "id", row)?;
                let text = string_value(&batch, "text", row)?;
                hits.push(DenseHit {
                    score: similarity(&batch, row),
                    payload: json!({"id": id.as_str(), "partition": partition, "text": text}),
                    id,
                });
            }
        }
        Ok(hits)
    }
}

/// Lance reports cosine distance; flip it into a similarity. Older
/// column spellings are tolerated the same way the stored score is.
fn similarity(batch: &RecordBatch, row: usize) -> f32 {
    for column in ["_distance", "distance"] {
        if let Some(values) = batch
            .column_by_name(column)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        {
            return 1.0 - values.value(row);
        }
    }
    if let Some(values) = batch
        .column_by_name("_score")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
    {
        return values.value(row);
    }
    0.0
}

fn string_value(batch: &RecordBatch, column: &str, row: usize) -> Result<String> {
    let values = batch
        .column_by_name(column)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("result batch is missing the '{column}' column"))?;
    Ok(values.value(row).to_string())
}
