use crate::error::Result;
use crate::types::SearchMatch;

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// The retrieval seam the conversation engine consumes. Implementations
/// answer a free-text query with ranked matches, best first.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>>;
}
