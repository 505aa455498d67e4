//! Dense (embedding) retrieval by exact cosine similarity

use super::store::Corpus;
use crate::embedding::EmbeddingBackend;
use crate::error::{Result, RetrievalError};
use crate::types::{Embedding, ScoredDocument};
use std::sync::Arc;
use tracing::debug;

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > 0.0 {
        dot / denom
    } else {
        0.0
    }
}

/// Rank every vector against `query`; returns `(position, similarity)`
///
/// Descending by similarity; the sort is stable so ties keep corpus order.
pub fn rank_by_cosine(query: &[f32], vectors: &[Embedding], top_k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(position, v)| (position, cosine_similarity(query, v)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);
    scored
}

/// Dense retriever backed by an injected embedding function
#[derive(Debug, Clone)]
pub struct DenseRetriever {
    backend: Arc<dyn EmbeddingBackend>,
}

impl DenseRetriever {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn EmbeddingBackend> {
        &self.backend
    }

    /// Embed `query` and rank the corpus by cosine similarity
    pub fn search(&self, corpus: &Corpus, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        let query_vec = self.backend.embed(query)?;
        self.search_by_vector(corpus, &query_vec, top_k)
    }

    /// Rank the corpus against a precomputed query vector
    pub fn search_by_vector(
        &self,
        corpus: &Corpus,
        query_vec: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        if query_vec.len() != corpus.dimensions() {
            return Err(RetrievalError::DimensionMismatch {
                expected: corpus.dimensions(),
                actual: query_vec.len(),
            });
        }

        let ranked = rank_by_cosine(query_vec, corpus.embeddings(), top_k);
        debug!("Dense search: {} results", ranked.len());

        Ok(ranked
            .into_iter()
            .map(|(position, score)| {
                ScoredDocument::new(corpus.documents()[position].scored(score), score)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_rank_by_cosine_orders_descending() {
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let ranked = rank_by_cosine(&[1.0, 0.0], &vectors, 3);
        let order: Vec<usize> = ranked.iter().map(|(p, _)| *p).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_rank_by_cosine_ties_keep_corpus_order() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 0.0], vec![3.0, 0.0]];
        let ranked = rank_by_cosine(&[1.0, 0.0], &vectors, 4);
        let order: Vec<usize> = ranked.iter().map(|(p, _)| *p).collect();
        assert_eq!(order, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_rank_by_cosine_truncates() {
        let vectors = vec![vec![1.0], vec![1.0], vec![1.0]];
        assert_eq!(rank_by_cosine(&[1.0], &vectors, 2).len(), 2);
        assert!(rank_by_cosine(&[1.0], &vectors, 0).is_empty());
    }
}
