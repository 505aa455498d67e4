//! Retrieval pipeline and reranker configuration

use serde::{Deserialize, Serialize};

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates taken from dense search
    #[serde(default = "default_dense_k")]
    pub dense_k: usize,
    /// Candidates taken from BM25 search
    #[serde(default = "default_sparse_k")]
    pub sparse_k: usize,
    /// Documents returned after reranking
    #[serde(default = "default_final_k")]
    pub final_k: usize,
    /// RRF k parameter
    #[serde(default = "default_rrf_k")]
    pub rrf_k: usize,
    /// Fused candidates handed to the reranker at most
    #[serde(default = "default_max_rerank_candidates")]
    pub max_rerank_candidates: usize,
    /// Run dense and BM25 search on separate threads
    #[serde(default = "default_parallel_first_stage")]
    pub parallel_first_stage: bool,
    /// Per-query deadline in milliseconds (None disables it)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: Option<u64>,
    /// Tantivy writer heap used while building the BM25 index
    #[serde(default = "default_bm25_writer_memory")]
    pub bm25_writer_memory_bytes: usize,
}

fn default_dense_k() -> usize {
    100
}

fn default_sparse_k() -> usize {
    100
}

fn default_final_k() -> usize {
    5
}

fn default_rrf_k() -> usize {
    60
}

fn default_max_rerank_candidates() -> usize {
    200
}

fn default_parallel_first_stage() -> bool {
    true
}

fn default_query_timeout_ms() -> Option<u64> {
    Some(30_000)
}

fn default_bm25_writer_memory() -> usize {
    50_000_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dense_k: default_dense_k(),
            sparse_k: default_sparse_k(),
            final_k: default_final_k(),
            rrf_k: default_rrf_k(),
            max_rerank_candidates: default_max_rerank_candidates(),
            parallel_first_stage: default_parallel_first_stage(),
            query_timeout_ms: default_query_timeout_ms(),
            bm25_writer_memory_bytes: default_bm25_writer_memory(),
        }
    }
}

/// Pairwise scorer used by the reranking stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Fraction of query terms found in the document
    #[default]
    TermOverlap,
    /// Cross-encoder served behind a `/rerank` HTTP endpoint
    Http,
}

/// Reranker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    #[serde(default)]
    pub scorer: ScorerKind,
    /// HTTP scorer: endpoint URL (text-embeddings-inference style `/rerank`)
    #[serde(default = "default_rerank_endpoint")]
    pub endpoint: String,
    /// HTTP scorer: optional bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// HTTP scorer: request timeout in seconds
    #[serde(default = "default_rerank_timeout")]
    pub timeout_secs: u64,
}

fn default_rerank_endpoint() -> String {
    "http://localhost:8081/rerank".to_string()
}

fn default_rerank_timeout() -> u64 {
    30
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            scorer: ScorerKind::default(),
            endpoint: default_rerank_endpoint(),
            api_key: None,
            timeout_secs: default_rerank_timeout(),
        }
    }
}
