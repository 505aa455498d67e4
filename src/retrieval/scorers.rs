//! Pairwise scorer implementations
//!
//! - **TermOverlapScorer**: lexical fallback, fraction of query terms present
//! - **HttpScorer**: cross-encoder behind a text-embeddings-inference `/rerank` endpoint
//! - **FnScorer**: any closure, e.g. an in-process model or a test stub

use super::reranker::{PairwiseScorer, ScoringError, ScoringResult};
use crate::config::{RerankerConfig, ScorerKind};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Scores a document by the share of distinct query terms it contains
#[derive(Debug, Clone, Copy, Default)]
pub struct TermOverlapScorer;

impl PairwiseScorer for TermOverlapScorer {
    fn score(&self, query: &str, document: &str) -> ScoringResult<f32> {
        let query_lower = query.to_lowercase();
        let query_terms: HashSet<&str> = query_lower.split_whitespace().collect();
        if query_terms.is_empty() {
            return Ok(0.0);
        }

        let content_lower = document.to_lowercase();
        let overlap = query_terms
            .iter()
            .filter(|term| content_lower.contains(*term))
            .count();

        Ok(overlap as f32 / query_terms.len() as f32)
    }

    fn name(&self) -> &str {
        "term_overlap"
    }
}

type ScoreFn = dyn Fn(&str, &str) -> ScoringResult<f32> + Send + Sync;

/// Pairwise scorer wrapping a closure
pub struct FnScorer {
    name: String,
    score_fn: Box<ScoreFn>,
}

impl FnScorer {
    /// Wrap an infallible scoring function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> f32 + Send + Sync + 'static,
    {
        Self::fallible(move |q, d| Ok(f(q, d)))
    }

    /// Wrap a scoring function that may fail
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> ScoringResult<f32> + Send + Sync + 'static,
    {
        Self {
            name: "fn".to_string(),
            score_fn: Box::new(f),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Debug for FnScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnScorer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PairwiseScorer for FnScorer {
    fn score(&self, query: &str, document: &str) -> ScoringResult<f32> {
        (self.score_fn)(query, document)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cross-encoder served over HTTP
///
/// Request: `{"query": "...", "texts": ["...", ...]}`;
/// response: `[{"index": 0, "score": 0.93}, ...]` in any order.
#[derive(Debug)]
pub struct HttpScorer {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct RerankHit {
    index: usize,
    score: f32,
}

impl HttpScorer {
    pub fn new(config: &RerankerConfig) -> ScoringResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| ScoringError::ScoringFailed(format!("Invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        info!("HTTP reranker: endpoint={}", config.endpoint);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl PairwiseScorer for HttpScorer {
    fn score(&self, query: &str, document: &str) -> ScoringResult<f32> {
        self.score_batch(query, &[document])?
            .pop()
            .ok_or_else(|| ScoringError::ScoringFailed("No score returned".to_string()))
    }

    fn score_batch(&self, query: &str, documents: &[&str]) -> ScoringResult<Vec<f32>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::to_vec(&RerankRequest {
            query,
            texts: documents,
        })
        .map_err(|e| ScoringError::ScoringFailed(format!("Failed to serialize request: {}", e)))?;

        debug!("POST {} ({} texts)", self.endpoint, documents.len());

        // Same as the HTTP embedding backend: blocking reqwest must not run on
        // a tokio worker thread.
        let response = std::thread::scope(|s| {
            s.spawn(|| self.client.post(&self.endpoint).body(body).send())
                .join()
        })
        .map_err(|_| ScoringError::ScoringFailed("HTTP request thread panicked".to_string()))??;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ScoringError::ScoringFailed(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let hits: Vec<RerankHit> = response
            .json()
            .map_err(|e| ScoringError::ScoringFailed(format!("Failed to parse response: {}", e)))?;

        scores_in_input_order(hits, documents.len())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Put `/rerank` hits back in input order; every input must be scored once
fn scores_in_input_order(hits: Vec<RerankHit>, expected: usize) -> ScoringResult<Vec<f32>> {
    if hits.len() != expected {
        return Err(ScoringError::CountMismatch {
            expected,
            actual: hits.len(),
        });
    }

    let mut scores: Vec<Option<f32>> = vec![None; expected];
    for hit in hits {
        match scores.get_mut(hit.index) {
            Some(slot) if slot.is_none() => *slot = Some(hit.score),
            _ => {
                return Err(ScoringError::ScoringFailed(format!(
                    "invalid or repeated index {} in rerank response",
                    hit.index
                )))
            }
        }
    }

    // Every slot is filled: `expected` distinct in-range indices were seen
    Ok(scores.into_iter().flatten().collect())
}

/// Create a pairwise scorer from configuration
pub fn create_scorer(config: &RerankerConfig) -> ScoringResult<Arc<dyn PairwiseScorer>> {
    match config.scorer {
        ScorerKind::TermOverlap => {
            info!("Using term-overlap reranking");
            Ok(Arc::new(TermOverlapScorer))
        }
        ScorerKind::Http => Ok(Arc::new(HttpScorer::new(config)?)),
    }
}
