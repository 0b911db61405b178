use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use std::path::Path;
use std::sync::Arc;

use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};

use ateco_core::types::CorpusRecord;
use crate::schema::build_arrow_schema;

const INSERT_BATCH: usize = 1000;

/// Writes corpus records plus their embeddings into a LanceDB table.
pub struct CorpusWriter {
    pub(crate) db: Connection,
    pub(crate) table_name: String,
    embedding_dim: i32,
}

impl CorpusWriter {
    pub async fn new(db_path: &Path, table_name: &str, embedding_dim: usize) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db, table_name: table_name.to_string(), embedding_dim: embedding_dim as i32 })
    }

    /// Drop the table if it already exists so a rebuild starts clean.
    pub async fn reset(&self) -> Result<()> {
        let names = self.db.table_names().execute().await?;
        if names.contains(&self.table_name) {
            self.db.drop_table(&self.table_name, &[]).await?;
        }
        Ok(())
    }

    pub async fn index_records(&self, records: &[CorpusRecord], embeddings: &[Vec<f32>]) -> Result<()> {
        if records.is_empty() {
            tracing::warn!("no corpus records to index");
            return Ok(());
        }
        assert_eq!(records.len(), embeddings.len(), "records and embeddings length must match");
        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        let mut batch: Vec<(&CorpusRecord, &Vec<f32>)> = Vec::new();
        for (i, pair) in records.iter().zip(embeddings.iter()).enumerate() {
            batch.push(pair);
            pb.set_position((i + 1) as u64);
            if batch.len() >= INSERT_BATCH || i == records.len() - 1 {
                self.insert_batch(&batch).await?;
                batch.clear();
            }
        }
        pb.finish_with_message("indexing completed");
        tracing::info!(records = records.len(), table = %self.table_name, "corpus indexed");
        Ok(())
    }

    async fn insert_batch(&self, pairs: &[(&CorpusRecord, &Vec<f32>)]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let record_batch = self.to_record_batch(pairs)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if self.db.table_names().execute().await?.contains(&self.table_name) {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }

    fn to_record_batch(&self, pairs: &[(&CorpusRecord, &Vec<f32>)]) -> Result<RecordBatch> {
        let schema = build_arrow_schema(self.embedding_dim);
        let mut ids = Vec::new();
        let mut codes = Vec::new();
        let mut titles = Vec::new();
        let mut descriptions = Vec::new();
        let mut activities: Vec<Option<String>> = Vec::new();
        let mut texts = Vec::new();
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for (record, vector) in pairs {
            ids.push(record.id as i32);
            codes.push(record.meta.code.clone());
            titles.push(record.meta.title.clone());
            descriptions.push(record.meta.description.clone());
            activities.push(record.meta.activity.clone());
            texts.push(record.text.clone());
            vectors.push(Some(vector.iter().map(|&x| Some(x)).collect()));
        }
        let record_batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(ids)),
                Arc::new(StringArray::from(codes)),
                Arc::new(StringArray::from(titles)),
                Arc::new(StringArray::from(descriptions)),
                Arc::new(StringArray::from(activities)),
                Arc::new(StringArray::from(texts)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                    vectors.into_iter(),
                    self.embedding_dim,
                )),
            ],
        )?;
        Ok(record_batch)
    }
}
