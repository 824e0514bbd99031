//! Display-text extraction from heterogeneous knowledge-base records.
//!
//! Snapshot files and dense payloads carry three record shapes: a plain
//! `text` field, a `text_blocks` mapping, or a question/answer pair.
//! `RecordText` is the closed set of those shapes; both the snapshot
//! loader and the dense-hit path go through [`extract_text`], so there is
//! exactly one place where the fallback order lives.

use serde_json::Value;

/// A knowledge-base record reduced to its renderable shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordText {
    Plain(String),
    Blocks(Vec<(String, String)>),
    QuestionAnswer { question: String, answer: String },
}

impl RecordText {
    /// Classify a JSON record. Order matters: an explicit `text` field
    /// wins (the `text_bm25` payload alias counts), then a `text_blocks`
    /// mapping, then a question/answer pair. Returns `None` when the
    /// record has no usable text at all.
    pub fn from_value(value: &Value) -> Option<RecordText> {
        let object = value.as_object()?;

        for key in ["text", "text_bm25"] {
            if let Some(text) = object.get(key).and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    return Some(RecordText::Plain(text.trim().to_string()));
                }
            }
        }

        if let Some(blocks) = object.get("text_blocks").and_then(Value::as_object) {
            let pairs: Vec<(String, String)> = blocks
                .iter()
                .filter_map(|(key, value)| render_block(value).map(|v| (key.clone(), v)))
                .collect();
            if !pairs.is_empty() {
                return Some(RecordText::Blocks(pairs));
            }
        }

        let question = object.get("question").and_then(Value::as_str).unwrap_or("");
        let answer = object.get("answer").and_then(Value::as_str).unwrap_or("");
        if !question.trim().is_empty() || !answer.trim().is_empty() {
            return Some(RecordText::QuestionAnswer {
                question: question.trim().to_string(),
                answer: answer.trim().to_string(),
            });
        }

        None
    }

    /// Render the record as a single text blob.
    pub fn render(&self) -> String {
        match self {
            RecordText::Plain(text) => text.clone(),
            RecordText::Blocks(pairs) => pairs
                .iter()
                .map(|(_, value)| value.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            RecordText::QuestionAnswer { question, answer } => {
                format!("Question: {question}\nAnswer: {answer}")
            }
        }
    }
}

/// Extract display text from a record or dense payload, probing a nested
/// `raw` object when the top level has nothing usable.
pub fn extract_text(value: &Value) -> Option<String> {
    if let Some(record) = RecordText::from_value(value) {
        return Some(record.render());
    }
    let raw = value.as_object()?.get("raw")?;
    RecordText::from_value(raw).map(|record| record.render())
}

fn render_block(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => serde_json::to_string(other).ok(),
    }
}
