use ateco_core::types::{CatalogEntry, CorpusRecord};
use ateco_core::corpus::build_corpus;
use ateco_embed::get_default_embedder;
use ateco_vector::{CorpusSearcher, CorpusWriter};
use tempfile::TempDir;

fn sample_entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            code: "01.11".to_string(),
            title: "Cereal farming".to_string(),
            hierarchy: "A > Crops > Cereals".to_string(),
            descriptor: Some("Includes:\n* wheat growing\n* maize growing".to_string()),
            activity: Some("farming".to_string()),
        },
        CatalogEntry {
            code: "11.02".to_string(),
            title: "Wine production".to_string(),
            hierarchy: "C > Beverages > Wine".to_string(),
            descriptor: Some("Includes:\n* wine bottling\n* wine blending".to_string()),
            activity: Some("manufacturing".to_string()),
        },
    ]
}

#[tokio::test]
async fn write_then_search_round_trip() -> anyhow::Result<()> {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let entries = sample_entries();
    let records: Vec<CorpusRecord> = build_corpus(&entries);
    assert_eq!(records.len(), 4);

    let embedder = get_default_embedder()?;
    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts)?;

    let tmp = TempDir::new()?;
    let table = "corpus_test";
    let writer = CorpusWriter::new(tmp.path(), table, embedder.dim()).await?;
    writer.index_records(&records, &embeddings).await?;

    let searcher = CorpusSearcher::new(tmp.path(), table).await?;
    assert!(searcher.table_exists().await?);

    let query_vec = embedder.embed_batch(&["growing of maize".to_string()])?.remove(0);
    let matches = searcher.search_vec(&query_vec, 4).await?;
    assert!(!matches.is_empty());

    // Descending order.
    for pair in matches.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    // Metadata round-trip on the fragment that shares query vocabulary.
    let maize = matches
        .iter()
        .find(|m| m.text.contains("maize"))
        .expect("maize fragment retrieved");
    assert_eq!(maize.meta.code, "01.11");
    assert_eq!(maize.meta.title, "Cereal farming");
    assert_eq!(maize.meta.activity.as_deref(), Some("farming"));
    assert!(maize.meta.description.contains("maize growing"));
    assert!(maize.score > 0.0);
    Ok(())
}

#[tokio::test]
async fn reset_drops_existing_table() -> anyhow::Result<()> {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let entries = sample_entries();
    let records = build_corpus(&entries);
    let embedder = get_default_embedder()?;
    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts)?;

    let tmp = TempDir::new()?;
    let table = "corpus_reset";
    let writer = CorpusWriter::new(tmp.path(), table, embedder.dim()).await?;
    writer.index_records(&records, &embeddings).await?;
    writer.reset().await?;

    let searcher = CorpusSearcher::new(tmp.path(), table).await?;
    assert!(!searcher.table_exists().await?);
    Ok(())
}
