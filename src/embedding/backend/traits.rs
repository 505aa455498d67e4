//! Embedding backend trait definitions
//!
//! Defines the injected embedding function the retrieval core depends on.

use crate::types::Embedding;
use std::fmt::Debug;

/// Errors that can occur during embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// Embedding generation failed
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    /// Rate limited by the API
    #[error("Rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds, if provided by the API
        retry_after_ms: Option<u64>,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Core trait for embedding backends
///
/// The trait is object-safe so stores can hold an `Arc<dyn EmbeddingBackend>`.
/// Calls are synchronous; deadline handling belongs to the caller.
pub trait EmbeddingBackend: Send + Sync + Debug {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> EmbeddingResult<Embedding>;

    /// Generate embeddings for a batch of texts
    ///
    /// The default implementation calls `embed` for each text.
    fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embedding dimensions produced by this backend
    fn dimensions(&self) -> usize;

    /// Backend name (e.g., "hash", "http", "fn")
    fn name(&self) -> &str;
}
