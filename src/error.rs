//! Error types for the retrieval core

use crate::embedding::backend::EmbeddingError;
use crate::retrieval::ScoringError;

/// Errors surfaced by indexing and retrieval
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// A search was attempted before any corpus was indexed
    #[error("no corpus indexed; call index() first")]
    NotIndexed,

    /// The corpus handed to `index()` was empty or malformed
    #[error("invalid corpus: {0}")]
    Index(String),

    /// The query ran past its deadline
    #[error("retrieval timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    Timeout { elapsed_ms: u64, budget_ms: u64 },

    /// The caller cancelled the query
    #[error("retrieval cancelled")]
    Cancelled,

    /// Query vector does not match the corpus dimension
    #[error("embedding dimension mismatch: corpus has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Injected embedding backend failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Injected pairwise scorer failed
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// Sparse index failure
    #[error("sparse index error: {0}")]
    Sparse(#[from] tantivy::TantivyError),
}

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;
