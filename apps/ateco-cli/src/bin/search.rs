use std::env;

use ateco_core::config::{expand_path, Config};
use ateco_core::traits::Retriever;
use ateco_retrieval::{aggregate, KnowledgeBase};

const TABLE: &str = "corpus";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let args: Vec<String> = env::args().collect();
    let query = match args.get(1) {
        Some(q) => q.clone(),
        None => {
            eprintln!("Usage: ateco-search \"<query>\"");
            std::process::exit(1);
        }
    };

    let db_path = expand_path(
        config
            .get::<String>("data.lancedb_index_dir")
            .unwrap_or_else(|_| "data/indexes/lancedb".to_string()),
    );
    let model_id: String = config
        .get("embedding.model_id")
        .unwrap_or_else(|_| "BAAI/bge-m3".to_string());
    let top_k: usize = config.get("search.top_k").unwrap_or(5);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let kb = KnowledgeBase::open(&db_path, TABLE, &model_id).await?;
        let matches = kb.search(&query, top_k).await?;
        let rows = aggregate(&matches);
        if rows.is_empty() {
            println!("No candidates found.");
            return Ok(());
        }
        for row in rows {
            println!("{:<8} {:>6.3}  {}", row.code, row.score, row.title);
        }
        Ok(())
    })
}
