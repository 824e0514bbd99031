use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use ragdb_core::config::Config;
use ragdb_core::snapshot::load_snapshot;
use ragdb_core::traits::Embedder;
use ragdb_core::types::Document;
use ragdb_dense::{DenseWriter, LanceDenseBackend};
use ragdb_hybrid::HybridRetriever;
use ragdb_lexical::{TfIdfIndex, Tokenizer};

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|query> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn snapshot_dir(config: &Config, args: &[String]) -> PathBuf {
    args.first().map(PathBuf::from).unwrap_or_else(|| {
        let dir: String = config
            .get("data.snapshot_dir")
            .unwrap_or_else(|_| "./knowledge_base".to_string());
        PathBuf::from(dir)
    })
}

fn lancedb_dir(config: &Config) -> PathBuf {
    PathBuf::from(
        config
            .get::<String>("data.lancedb_dir")
            .unwrap_or_else(|_| "./data/lancedb".to_string()),
    )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            let snapshot = snapshot_dir(&config, &args);
            let lancedb = lancedb_dir(&config);
            println!("Ingesting snapshot from {}", snapshot.display());

            let documents = load_snapshot(&snapshot)?;
            let index = Arc::new(TfIdfIndex::build(documents, Arc::new(Tokenizer::new()))?);

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let writer = DenseWriter::connect(&lancedb, index.dim()).await?;
                for partition in index.partitions() {
                    let docs: Vec<Document> = index
                        .documents()
                        .iter()
                        .filter(|d| &d.partition == partition)
                        .cloned()
                        .collect();
                    let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
                    let embeddings = index.embed_batch(&texts)?;
                    writer.ingest_partition(partition, &docs, &embeddings).await?;
                }
                anyhow::Ok(())
            })?;

            println!(
                "Ingest complete ({} documents, {} partitions)",
                index.len(),
                index.partitions().len()
            );
        }
        "query" => {
            let query_text = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: ragdb query \"<query>\" [limit]");
                std::process::exit(1)
            });
            let limit: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(5);

            let snapshot = {
                let dir: String = config
                    .get("data.snapshot_dir")
                    .unwrap_or_else(|_| "./knowledge_base".to_string());
                PathBuf::from(dir)
            };
            let lancedb = lancedb_dir(&config);

            let documents = load_snapshot(&snapshot)?;
            let tokenizer = Arc::new(Tokenizer::new());
            let index = Arc::new(TfIdfIndex::build(documents, tokenizer.clone())?);
            let partitions = index.partitions().to_vec();

            let rt = tokio::runtime::Runtime::new()?;
            let response = rt.block_on(async {
                let mut retriever = HybridRetriever::new(tokenizer.clone(), config.retrieval())
                    .with_lexical(index.clone());
                match LanceDenseBackend::connect(&lancedb).await {
                    Ok(backend) => {
                        let embedder: Arc<dyn Embedder> = index.clone();
                        retriever = retriever.with_dense(Arc::new(backend), embedder);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "dense store unavailable, lexical search only");
                    }
                }
                retriever.search(&query_text, &partitions, limit).await
            })?;

            println!(
                "\nFound {} passages (mode: {:?}) for: \"{}\"",
                response.passages.len(),
                response.mode,
                query_text
            );
            for (i, passage) in response.passages.iter().enumerate() {
                println!(
                    "\n  {}. score={:.4}  partition={}",
                    i + 1,
                    passage.score,
                    passage.partition
                );
                println!("     {}", passage.text.replace('\n', "\n     "));
            }
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
