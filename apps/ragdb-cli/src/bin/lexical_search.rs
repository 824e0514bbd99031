use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use ragdb_core::snapshot::load_snapshot;
use ragdb_lexical::{TfIdfIndex, Tokenizer};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [snapshot_dir] [limit]", args[0]);
        eprintln!("Example: {} 'когда заезд' ./knowledge_base 5", args[0]);
        std::process::exit(1);
    }
    let query = &args[1];
    let snapshot = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./knowledge_base"));
    let limit: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(10);

    let documents = load_snapshot(&snapshot)?;
    let index = TfIdfIndex::build(documents, Arc::new(Tokenizer::new()))?;

    let hits = index.search(query, None, limit);
    println!("Found {} passages for: \"{}\"", hits.len(), query);
    for (i, hit) in hits.iter().enumerate() {
        let doc = index.document(hit.doc);
        println!(
            "\n  {}. score={:.4}  partition={}  id={}",
            i + 1,
            hit.score,
            doc.partition,
            doc.id
        );
        println!("     {}", doc.text.replace('\n', "\n     "));
    }
    Ok(())
}
