//! Deterministic hash-based embedding backend
//!
//! Produces vectors that are stable for identical text but carry no semantic
//! meaning. Useful as a fallback when no model endpoint is configured, and in
//! tests that only need determinism.

use super::traits::{EmbeddingBackend, EmbeddingResult};
use crate::types::Embedding;

/// Hash-based fallback backend
#[derive(Debug, Clone)]
pub struct HashBackend {
    dimensions: usize,
}

impl HashBackend {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl EmbeddingBackend for HashBackend {
    fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        Ok(hash_based_embedding(text, self.dimensions))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Generate a deterministic hash-based embedding with values in [-1, 1]
///
/// WARNING: Hash-based embeddings will not produce meaningful dense rankings.
pub fn hash_based_embedding(content: &str, dims: usize) -> Vec<f32> {
    let hash = xxhash_rust::xxh3::xxh3_64(content.as_bytes());
    (0..dims)
        .map(|i| {
            let mixed = xxhash_rust::xxh3::xxh3_64_with_seed(&hash.to_le_bytes(), i as u64);
            ((mixed % 1000) as f32 / 500.0) - 1.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_embedding_is_deterministic() {
        let a = hash_based_embedding("sharpe ratio", 16);
        let b = hash_based_embedding("sharpe ratio", 16);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_hash_embedding_differs_by_content() {
        let a = hash_based_embedding("sharpe ratio", 16);
        let b = hash_based_embedding("sortino ratio", 16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_embedding_range() {
        let v = hash_based_embedding("value at risk", 64);
        assert!(v.iter().all(|x| (-1.0..=1.0).contains(x)));
    }

    #[test]
    fn test_hash_backend_batch() {
        let backend = HashBackend::new(8);
        let out = backend
            .embed_batch(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], hash_based_embedding("a", 8));
        assert_eq!(backend.name(), "hash");
    }
}
