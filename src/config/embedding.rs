//! Embedding backend configuration

use serde::{Deserialize, Serialize};

fn default_endpoint() -> String {
    "http://localhost:8080/v1/embeddings".to_string()
}

fn default_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_timeout() -> u64 {
    30
}

fn default_batch_size() -> usize {
    100
}

/// Which embedding backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendKind {
    /// Deterministic hash vectors (no semantics; offline fallback)
    #[default]
    Hash,
    /// OpenAI-compatible HTTP endpoint
    Http,
}

/// Embedding configuration
///
/// ```toml
/// [embedding]
/// backend = "http"
/// endpoint = "https://api.openai.com/v1/embeddings"
/// model = "text-embedding-3-small"
/// dimensions = 1536
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackendKind,
    /// HTTP backend: API endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// HTTP backend: API key (falls back to FINRAG_EMBEDDING_API_KEY / OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    /// HTTP backend: model name sent with each request
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// HTTP backend: request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// HTTP backend: maximum texts per request
    #[serde(default = "default_batch_size")]
    pub max_batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackendKind::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            dimensions: default_dimensions(),
            timeout_secs: default_timeout(),
            max_batch_size: default_batch_size(),
        }
    }
}
