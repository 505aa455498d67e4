//! Configuration for finrag

mod embedding;
mod graph;
mod logging;
mod retrieval;

pub use embedding::{EmbeddingBackendKind, EmbeddingConfig};
pub use graph::{GraphConfig, MAX_PATH_LENGTH_CEILING};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use retrieval::{RerankerConfig, RetrievalConfig, ScorerKind};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub reranker: RerankerConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML (used by `finrag init`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Validate all configuration fields.
    ///
    /// Collects every violation and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Embedding
        if self.embedding.dimensions == 0 {
            errors.push("embedding dimensions must be positive".to_string());
        }
        if self.embedding.dimensions > 4096 {
            errors.push("embedding dimensions must be <= 4096".to_string());
        }
        if self.embedding.max_batch_size == 0 {
            errors.push("embedding max_batch_size must be positive".to_string());
        }
        if self.embedding.backend == EmbeddingBackendKind::Http
            && self.embedding.endpoint.trim().is_empty()
        {
            errors.push("embedding endpoint is required for the http backend".to_string());
        }

        // Retrieval
        let r = &self.retrieval;
        if r.rrf_k == 0 {
            errors.push("rrf_k must be positive".to_string());
        }
        if r.dense_k == 0 {
            errors.push("dense_k must be positive".to_string());
        }
        if r.sparse_k == 0 {
            errors.push("sparse_k must be positive".to_string());
        }
        if r.final_k == 0 {
            errors.push("final_k must be positive".to_string());
        }
        if r.max_rerank_candidates < r.final_k {
            errors.push(format!(
                "max_rerank_candidates ({}) must be >= final_k ({})",
                r.max_rerank_candidates, r.final_k
            ));
        }
        if r.query_timeout_ms == Some(0) {
            errors.push("query_timeout_ms must be positive when set".to_string());
        }
        if r.bm25_writer_memory_bytes < 15_000_000 {
            errors.push("bm25_writer_memory_bytes must be >= 15000000".to_string());
        }

        // Reranker
        if self.reranker.scorer == ScorerKind::Http && self.reranker.endpoint.trim().is_empty() {
            errors.push("reranker endpoint is required for the http scorer".to_string());
        }

        // Graph
        let g = &self.graph;
        if g.max_nodes == 0 {
            errors.push("graph max_nodes must be positive".to_string());
        }
        if g.paths_per_pair == 0 {
            errors.push("graph paths_per_pair must be positive".to_string());
        }
        if g.max_path_length == 0 || g.max_path_length > MAX_PATH_LENGTH_CEILING {
            errors.push(format!(
                "graph max_path_length must be between 1 and {}",
                MAX_PATH_LENGTH_CEILING
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn default_config_passes_validation() {
        assert!(valid_config().validate().is_ok(), "default config should be valid");
    }

    #[test]
    fn validate_rejects_zero_embedding_dimensions() {
        let mut cfg = valid_config();
        cfg.embedding.dimensions = 0;
        let err = cfg.validate().unwrap_err();
        assert!(
            err.to_string().contains("embedding dimensions must be positive"),
            "unexpected error message: {}",
            err
        );
    }

    #[test]
    fn validate_rejects_oversized_embedding_dimensions() {
        let mut cfg = valid_config();
        cfg.embedding.dimensions = 5000;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("embedding dimensions must be <= 4096"));
    }

    #[test]
    fn validate_rejects_zero_rrf_k() {
        let mut cfg = valid_config();
        cfg.retrieval.rrf_k = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("rrf_k must be positive"));
    }

    #[test]
    fn validate_rejects_rerank_budget_below_final_k() {
        let mut cfg = valid_config();
        cfg.retrieval.final_k = 10;
        cfg.retrieval.max_rerank_candidates = 5;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_rerank_candidates (5) must be >= final_k (10)"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = valid_config();
        cfg.retrieval.query_timeout_ms = Some(0);
        assert!(cfg.validate().is_err());

        cfg.retrieval.query_timeout_ms = None;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_path_length_above_ceiling() {
        let mut cfg = valid_config();
        cfg.graph.max_path_length = MAX_PATH_LENGTH_CEILING + 1;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("graph max_path_length must be between 1 and"));
    }

    #[test]
    fn validate_requires_endpoint_for_http_backend() {
        let mut cfg = valid_config();
        cfg.embedding.backend = EmbeddingBackendKind::Http;
        cfg.embedding.endpoint = "  ".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("embedding endpoint is required"));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut cfg = valid_config();
        cfg.embedding.dimensions = 0;
        cfg.retrieval.rrf_k = 0;
        cfg.graph.max_nodes = 0;
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("embedding dimensions must be positive"));
        assert!(msg.contains("rrf_k must be positive"));
        assert!(msg.contains("graph max_nodes must be positive"));
    }

    #[test]
    fn default_retrieval_config_values() {
        let ret = RetrievalConfig::default();
        assert_eq!(ret.dense_k, 100);
        assert_eq!(ret.sparse_k, 100);
        assert_eq!(ret.final_k, 5);
        assert_eq!(ret.rrf_k, 60);
        assert_eq!(ret.max_rerank_candidates, 200);
        assert!(ret.parallel_first_stage);
        assert_eq!(ret.query_timeout_ms, Some(30_000));
    }

    #[test]
    fn default_graph_config_values() {
        let g = GraphConfig::default();
        assert!(g.seed_financial);
        assert!(g.path.is_none());
        assert_eq!(g.max_nodes, 10);
        assert_eq!(g.max_depth, 2);
        assert_eq!(g.max_paths, 3);
        assert_eq!(g.paths_per_pair, 2);
        assert_eq!(g.max_path_length, 4);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = Config::from_toml(
            r#"
[retrieval]
final_k = 3

[embedding]
backend = "http"
endpoint = "http://localhost:1234/v1/embeddings"
dimensions = 768

[reranker]
scorer = "term_overlap"
"#,
        )
        .unwrap();
        assert_eq!(cfg.retrieval.final_k, 3);
        assert_eq!(cfg.retrieval.rrf_k, 60);
        assert_eq!(cfg.embedding.backend, EmbeddingBackendKind::Http);
        assert_eq!(cfg.embedding.dimensions, 768);
        assert_eq!(cfg.reranker.scorer, ScorerKind::TermOverlap);
        assert_eq!(cfg.logging.level, LogLevel::Info);
    }

    #[test]
    fn load_reports_invalid_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("finrag.toml");
        std::fs::write(&path, "[retrieval]\nrrf_k = 0\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("rrf_k must be positive"));
    }

    #[test]
    fn load_missing_file_fails_with_path() {
        let err = Config::load(Path::new("/nonexistent/finrag.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/finrag.toml"));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.retrieval.rrf_k, 60);
        assert_eq!(parsed.graph.max_path_length, 4);
    }
}
