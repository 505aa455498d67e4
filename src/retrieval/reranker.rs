//! Second-stage reranking with an injected pairwise scorer
//!
//! The scorer sees `(query, document)` pairs, typically a cross-encoder.
//! The final order is decided purely by its scores.

use crate::types::ScoredDocument;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Errors raised by pairwise scorers
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Scoring failed
    #[error("Scoring failed: {0}")]
    ScoringFailed(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Batch call returned the wrong number of scores
    #[error("scorer returned {actual} scores for {expected} candidates")]
    CountMismatch { expected: usize, actual: usize },

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for scoring operations
pub type ScoringResult<T> = Result<T, ScoringError>;

/// Relevance of a document to a query; higher is more relevant
pub trait PairwiseScorer: Send + Sync + Debug {
    fn score(&self, query: &str, document: &str) -> ScoringResult<f32>;

    /// Score many documents against one query, in order
    ///
    /// The default implementation calls `score` for each document.
    fn score_batch(&self, query: &str, documents: &[&str]) -> ScoringResult<Vec<f32>> {
        documents.iter().map(|d| self.score(query, d)).collect()
    }

    /// Scorer name (e.g., "term_overlap", "http", "fn")
    fn name(&self) -> &str;
}

/// Reranker driving a [`PairwiseScorer`]
#[derive(Debug, Clone)]
pub struct Reranker {
    scorer: Arc<dyn PairwiseScorer>,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn PairwiseScorer>) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &Arc<dyn PairwiseScorer> {
        &self.scorer
    }

    /// Score every candidate and return the best `top_k` by scorer output
    ///
    /// Earlier-stage scores are ignored. Ties keep candidate order.
    pub fn rerank(
        &self,
        query: &str,
        candidates: &[ScoredDocument],
        top_k: usize,
    ) -> ScoringResult<Vec<ScoredDocument>> {
        if candidates.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        debug!("Reranking {} candidates with '{}'", candidates.len(), self.scorer.name());

        let texts: Vec<&str> = candidates
            .iter()
            .map(|c| c.document.content.as_str())
            .collect();
        let scores = self.scorer.score_batch(query, &texts)?;
        if scores.len() != candidates.len() {
            return Err(ScoringError::CountMismatch {
                expected: candidates.len(),
                actual: scores.len(),
            });
        }

        let mut reranked: Vec<ScoredDocument> = candidates
            .iter()
            .zip(scores)
            .map(|(candidate, score)| ScoredDocument::new(candidate.document.scored(score), score))
            .collect();
        reranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        reranked.truncate(top_k);

        Ok(reranked)
    }
}
