use std::io::{BufRead, Write};
use std::path::PathBuf;

use ateco_chat::{prompt, Conversation, OllamaChatModel};
use ateco_core::config::{expand_path, Config};
use ateco_core::error::Error;
use ateco_retrieval::KnowledgeBase;

const TABLE: &str = "corpus";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let db_path = expand_path(
        config
            .get::<String>("data.lancedb_index_dir")
            .unwrap_or_else(|_| "data/indexes/lancedb".to_string()),
    );
    let embedding_model: String = config
        .get("embedding.model_id")
        .unwrap_or_else(|_| "BAAI/bge-m3".to_string());
    let llm_base_url: String = config
        .get("llm.base_url")
        .unwrap_or_else(|_| "http://localhost:11434".to_string());
    let llm_model: String = config
        .get("llm.model_id")
        .unwrap_or_else(|_| "llama3.2:3b".to_string());
    let top_k: usize = config.get("search.top_k").unwrap_or(5);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(&db_path, &embedding_model, &llm_base_url, &llm_model, top_k))
}

async fn run(
    db_path: &PathBuf,
    embedding_model: &str,
    llm_base_url: &str,
    llm_model: &str,
    top_k: usize,
) -> anyhow::Result<()> {
    let kb = KnowledgeBase::open(db_path, TABLE, embedding_model).await?;
    let chat_model = OllamaChatModel::new(llm_base_url, llm_model);
    let mut conversation = Conversation::new();

    println!("Descrivi la tua attività (es. \"Produzione di vini\"). Comandi: /clear, /quit");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match input {
            "/quit" | "/exit" => break,
            "/clear" => {
                conversation.clear();
                println!("Cronologia cancellata.");
                continue;
            }
            _ => {}
        }

        let result = conversation
            .respond(input, &kb, &chat_model, top_k, |token| {
                print!("{token}");
                let _ = std::io::stdout().flush();
            })
            .await;

        match result {
            Ok(reply) => {
                println!();
                if !reply.candidates.is_empty() {
                    println!("--- Candidati ---");
                    println!("{}", prompt::candidate_block(&reply.candidates));
                }
            }
            Err(Error::Retrieval(msg)) => eprintln!("\nRicerca non disponibile: {msg}"),
            Err(Error::Generation(msg)) => eprintln!("\nGenerazione interrotta, riprova: {msg}"),
            Err(e) => eprintln!("\nErrore: {e}"),
        }
    }
    Ok(())
}
