//! Core types shared by the retrieval pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a document
pub type DocumentId = String;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Free-form document metadata
pub type Metadata = HashMap<String, serde_json::Value>;

/// A document (or chunk) in the retrieval corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within a store
    pub id: DocumentId,
    /// Text that is embedded, BM25-indexed and shown to the reranker
    pub content: String,
    /// Arbitrary metadata carried through retrieval untouched
    #[serde(default)]
    pub metadata: Metadata,
    /// Relevance assigned by the stage that produced this copy
    #[serde(default)]
    pub score: f32,
    /// Provenance label (file, feed, calculation, ...)
    #[serde(default)]
    pub source: String,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
            score: 0.0,
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Copy of this document carrying `score`
    pub fn scored(&self, score: f32) -> Self {
        let mut doc = self.clone();
        doc.score = score;
        doc
    }
}

/// A document paired with the score a single stage assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

impl ScoredDocument {
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// Identifier/score pair recorded for each pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageScore {
    pub id: DocumentId,
    pub score: f32,
}

impl From<&ScoredDocument> for StageScore {
    fn from(scored: &ScoredDocument) -> Self {
        Self {
            id: scored.document.id.clone(),
            score: scored.score,
        }
    }
}

/// Retrieval method that contributed a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
    Dense,
    Bm25,
}

impl std::fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dense => f.write_str("dense"),
            Self::Bm25 => f.write_str("bm25"),
        }
    }
}
