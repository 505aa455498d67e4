//! JSONL corpus loading
//!
//! One JSON object per line: `{"id": "...", "content": "...", "metadata": {...},
//! "source": "..."}`. Only `content` is required; a missing id becomes
//! `doc-<line number>`.

use crate::types::{Document, Metadata};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CorpusRecord {
    #[serde(default)]
    id: Option<String>,
    content: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    source: String,
}

/// Parse JSONL text into documents; blank lines are skipped
pub fn parse_jsonl(text: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: CorpusRecord =
            serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", line_no))?;
        if record.content.trim().is_empty() {
            bail!("Empty content on line {}", line_no);
        }
        documents.push(Document {
            id: record.id.unwrap_or_else(|| format!("doc-{}", line_no)),
            content: record.content,
            metadata: record.metadata,
            score: 0.0,
            source: record.source,
        });
    }
    Ok(documents)
}

/// Load a JSONL corpus file
pub fn load_jsonl(path: &Path) -> Result<Vec<Document>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus '{}'", path.display()))?;
    let documents =
        parse_jsonl(&text).with_context(|| format!("Invalid corpus '{}'", path.display()))?;
    info!("Loaded {} documents from {}", documents.len(), path.display());
    Ok(documents)
}
