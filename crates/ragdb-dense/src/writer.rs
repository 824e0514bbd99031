//! Batched ingest into per-partition Lance tables.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use tracing::info;

use ragdb_core::types::Document;

use crate::schema::build_passage_schema;

pub struct DenseWriter {
    db: Connection,
    dim: i32,
}

impl DenseWriter {
    pub async fn connect(db_path: &Path, dim: usize) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self {
            db,
            dim: dim as i32,
        })
    }

    /// Replace the partition table with the given documents. A rebuild is
    /// always full: the old table is dropped first.
    pub async fn ingest_partition(
        &self,
        partition: &str,
        documents: &[Document],
        embeddings: &[Vec<f32>],
    ) -> Result<usize> {
        anyhow::ensure!(
            documents.len() == embeddings.len(),
            "documents/embeddings length mismatch: {} vs {}",
            documents.len(),
            embeddings.len()
        );
        if documents.is_empty() {
            return Ok(0);
        }

        if self
            .db
            .table_names()
            .execute()
            .await?
            .contains(&partition.to_string())
        {
            self.db.drop_table(partition, &[]).await?;
        }

        let pb = ProgressBar::new(documents.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} passages {msg}")?
                .progress_chars("#>-"),
        );

        let batch_size = 1000usize;
        let mut written = 0usize;
        for (docs, vectors) in documents
            .chunks(batch_size)
            .zip(embeddings.chunks(batch_size))
        {
            let batch = self.to_record_batch(docs, vectors)?;
            let schema = batch.schema();
            let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
            if self
                .db
                .table_names()
                .execute()
                .await?
                .contains(&partition.to_string())
            {
                self.db
                    .open_table(partition)
                    .execute()
                    .await?
                    .add(reader)
                    .execute()
                    .await?;
            } else {
                self.db.create_table(partition, reader).execute().await?;
            }
            written += docs.len();
            pb.set_position(written as u64);
        }
        pb.finish_and_clear();

        info!(partition, passages = written, "partition ingested");
        Ok(written)
    }

    fn to_record_batch(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
        let mut ids = Vec::with_capacity(documents.len());
        let mut partitions = Vec::with_capacity(documents.len());
        let mut texts = Vec::with_capacity(documents.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(documents.len());
        for (document, embedding) in documents.iter().zip(embeddings) {
            anyhow::ensure!(
                embedding.len() == self.dim as usize,
                "embedding dim mismatch: got {} expected {}",
                embedding.len(),
                self.dim
            );
            ids.push(document.id.clone());
            partitions.push(document.partition.clone());
            texts.push(document.text.clone());
            vectors.push(Some(embedding.iter().map(|&x| Some(x)).collect()));
        }

        let schema = build_passage_schema(self.dim);
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(partitions)),
                Arc::new(StringArray::from(texts)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<
                    arrow_array::types::Float32Type,
                    _,
                    _,
                >(vectors.into_iter(), self.dim)),
            ],
        )?;
        Ok(batch)
    }
}
