use std::env;
use std::path::PathBuf;

use ateco_core::catalog::load_catalog;
use ateco_core::config::{expand_path, Config};
use ateco_retrieval::KnowledgeBase;

const TABLE: &str = "corpus";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let args: Vec<String> = env::args().collect();

    let csv_path = args.get(1).map(PathBuf::from).unwrap_or_else(|| {
        let path: String = config
            .get("data.catalog_csv")
            .unwrap_or_else(|_| "data/ateco_2025_leaf.csv".to_string());
        expand_path(path)
    });
    let db_path = expand_path(
        config
            .get::<String>("data.lancedb_index_dir")
            .unwrap_or_else(|_| "data/indexes/lancedb".to_string()),
    );
    let model_id: String = config
        .get("embedding.model_id")
        .unwrap_or_else(|_| "BAAI/bge-m3".to_string());

    println!("Loading catalog from {}", csv_path.display());
    let entries = load_catalog(&csv_path)?;
    println!("Loaded {} catalog entries", entries.len());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { KnowledgeBase::build(&db_path, TABLE, &entries, &model_id).await })?;
    println!("Index written to {}", db_path.display());
    Ok(())
}
