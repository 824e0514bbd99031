use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ragdb_core::config::Config;
use ragdb_core::registry::TtlRegistry;
use ragdb_core::snapshot::load_snapshot;
use ragdb_hybrid::HybridRetriever;
use ragdb_lexical::{TfIdfIndex, Tokenizer};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let snapshot = PathBuf::from(
        config
            .get::<String>("data.snapshot_dir")
            .unwrap_or_else(|_| "./knowledge_base".to_string()),
    );
    let session_ttl: u64 = config
        .get("repl.session_ttl_secs")
        .unwrap_or(3600);

    let documents = load_snapshot(&snapshot)?;
    let tokenizer = Arc::new(Tokenizer::new());
    let index = Arc::new(TfIdfIndex::build(documents, tokenizer.clone())?);
    let partitions = index.partitions().to_vec();
    let retriever =
        HybridRetriever::new(tokenizer, config.retrieval()).with_lexical(index.clone());

    let mut sessions: TtlRegistry<String, Vec<String>> =
        TtlRegistry::new(Duration::from_secs(session_ttl));
    let user = "local".to_string();

    let rt = tokio::runtime::Runtime::new()?;
    println!(
        "ragdb repl — {} documents across {} partitions. Type a question, 'history' or 'quit'.",
        index.len(),
        partitions.len()
    );
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "history" {
            sessions.evict_expired();
            match sessions.lookup(&user) {
                Some(history) => {
                    for question in history.iter() {
                        println!("  {}", question);
                    }
                }
                None => println!("  (empty)"),
            }
            continue;
        }

        let response = rt.block_on(retriever.search(line, &partitions, 3))?;
        if response.passages.is_empty() {
            println!("No matching passages.");
        } else {
            for passage in &response.passages {
                println!(
                    "[{}] {:.4} {}",
                    passage.partition,
                    passage.score,
                    passage.text.replace('\n', " | ")
                );
            }
        }

        if sessions.lookup(&user).is_none() {
            sessions.insert(user.clone(), Vec::new());
        }
        if let Some(history) = sessions.lookup(&user) {
            history.push(line.to_string());
        }
    }
    Ok(())
}
