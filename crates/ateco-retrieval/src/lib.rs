//! Knowledge base facade: corpus build + embedding + vector search behind
//! the `Retriever` seam the conversation engine consumes.

use std::path::Path;

use ateco_core::corpus::build_corpus;
use ateco_core::error::{Error, Result};
use ateco_core::traits::{Embedder, Retriever};
use ateco_core::types::{CatalogEntry, SearchMatch};
use ateco_embed::embedder_for_model;
use ateco_vector::{CorpusSearcher, CorpusWriter};

pub mod aggregator;

pub use aggregator::{aggregate, filter_by_activity};

/// Embedding model + indexed corpus. Built once per process from the
/// catalog; read-only afterwards, safe to share across queries.
pub struct KnowledgeBase {
    embedder: Box<dyn Embedder>,
    searcher: CorpusSearcher,
}

impl KnowledgeBase {
    /// Split every catalog entry, embed the fragments and index them,
    /// replacing any previous table of the same name.
    pub async fn build(
        db_path: &Path,
        table: &str,
        entries: &[CatalogEntry],
        model_id: &str,
    ) -> anyhow::Result<Self> {
        let embedder = embedder_for_model(model_id)?;
        let records = build_corpus(entries);
        tracing::info!(entries = entries.len(), records = records.len(), "building knowledge base");

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts)?;

        let writer = CorpusWriter::new(db_path, table, embedder.dim()).await?;
        writer.reset().await?;
        writer.index_records(&records, &embeddings).await?;

        let searcher = CorpusSearcher::new(db_path, table).await?;
        Ok(Self { embedder, searcher })
    }

    /// Attach to a previously built corpus table.
    pub async fn open(db_path: &Path, table: &str, model_id: &str) -> anyhow::Result<Self> {
        let embedder = embedder_for_model(model_id)?;
        let searcher = CorpusSearcher::new(db_path, table).await?;
        if !searcher.table_exists().await? {
            anyhow::bail!("corpus table '{}' does not exist at {}; run the indexer first", table, db_path.display());
        }
        Ok(Self { embedder, searcher })
    }
}

#[async_trait::async_trait]
impl Retriever for KnowledgeBase {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>> {
        let query_vec = self
            .embedder
            .embed_batch(&[query.to_string()])
            .map_err(|e| Error::Retrieval(format!("query embedding: {e}")))?
            .remove(0);
        self.searcher
            .search_vec(&query_vec, top_k)
            .await
            .map_err(|e| Error::Retrieval(format!("vector search: {e}")))
    }
}
