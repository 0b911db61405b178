use anyhow::{anyhow, Result};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};
use std::path::Path;

use arrow_array::{Array, Float32Array, StringArray};

use ateco_core::types::{CodeMeta, SearchMatch};

/// Read side of the corpus table. Cosine distance is requested explicitly so
/// scores are plain similarity (1 - distance), higher = better.
pub struct CorpusSearcher {
    pub(crate) db: Connection,
    pub(crate) table_name: String,
}

impl CorpusSearcher {
    pub async fn new(db_path: &Path, table_name: &str) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db, table_name: table_name.to_string() })
    }

    /// True when the corpus table exists, i.e. an index was already built.
    pub async fn table_exists(&self) -> Result<bool> {
        Ok(self.db.table_names().execute().await?.contains(&self.table_name))
    }

    pub async fn search_vec(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<SearchMatch>> {
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut stream = table
            .vector_search(query_vec.to_vec())?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await?;

        let mut matches = Vec::new();
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
            let text_col = string_column(&batch, "text")?;
            let code_col = string_column(&batch, "code")?;
            let title_col = string_column(&batch, "title")?;
            let desc_col = string_column(&batch, "description")?;
            let activity_col = string_column(&batch, "activity")?;
            let distance_col = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>().cloned())
                .ok_or_else(|| anyhow!("_distance column missing"))?;
            for i in 0..batch.num_rows() {
                let activity = if activity_col.is_null(i) { None } else { Some(activity_col.value(i).to_string()) };
                matches.push(SearchMatch {
                    text: text_col.value(i).to_string(),
                    meta: CodeMeta {
                        code: code_col.value(i).to_string(),
                        title: title_col.value(i).to_string(),
                        description: desc_col.value(i).to_string(),
                        activity,
                    },
                    score: 1.0 - distance_col.value(i),
                });
            }
        }
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }
}

fn string_column(batch: &arrow_array::RecordBatch, name: &str) -> Result<StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>().cloned())
        .ok_or_else(|| anyhow!("{} column missing", name))
}
