//! Knowledge-base snapshot loader.
//!
//! The snapshot is a flat directory of `*.json` files, one per partition
//! (file stem = partition name), each holding a JSON array of records.
//! Records are reduced to plain [`Document`]s through the extraction
//! rules in [`crate::extract`]; a record's optional `title` and
//! `keywords` are folded into the indexed text so category labels and
//! tags stay searchable.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::extract::extract_text;
use crate::types::Document;

/// Load every partition of a snapshot directory.
///
/// Files are visited in sorted order so document ids are stable across
/// loads. Unreadable files, non-array files and records without
/// extractable text are skipped with a warning; an entirely empty
/// snapshot is a configuration error.
pub fn load_snapshot(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(Error::Snapshot(format!(
            "snapshot directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<_> = fs::read_dir(dir)
        .map_err(|e| Error::Snapshot(format!("cannot read {}: {e}", dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in &paths {
        let Some(partition) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let payload = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read snapshot file, skipping");
                continue;
            }
        };
        let parsed: Value = match serde_json::from_str(&payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot parse snapshot file, skipping");
                continue;
            }
        };
        let Some(records) = parsed.as_array() else {
            warn!(path = %path.display(), "expected a JSON array of records, skipping");
            continue;
        };

        for (ordinal, record) in records.iter().enumerate() {
            match record_to_document(partition, ordinal, record) {
                Some(document) => documents.push(document),
                None => {
                    warn!(partition, ordinal, "record has no extractable text, skipping");
                }
            }
        }
    }

    if documents.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "knowledge base at {} is empty or has no valid documents",
            dir.display()
        )));
    }

    info!(
        documents = documents.len(),
        partitions = paths.len(),
        "knowledge-base snapshot loaded"
    );
    Ok(documents)
}

fn record_to_document(partition: &str, ordinal: usize, record: &Value) -> Option<Document> {
    let body = extract_text(record)?;

    let mut parts = Vec::new();
    if let Some(title) = record.get("title").and_then(Value::as_str) {
        if !title.trim().is_empty() {
            parts.push(title.trim().to_string());
        }
    }
    parts.push(body);
    if let Some(keywords) = record.get("keywords").and_then(Value::as_array) {
        let values: Vec<&str> = keywords
            .iter()
            .filter_map(Value::as_str)
            .filter(|k| !k.trim().is_empty())
            .collect();
        if !values.is_empty() {
            parts.push(format!("Keywords: {}", values.join(", ")));
        }
    }

    let id = record
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{partition}:{ordinal}"));

    Some(Document {
        id,
        partition: partition.to_string(),
        text: parts.join("\n"),
    })
}
