//! Closure-backed embedding backend
//!
//! Lets callers inject any `Fn(&str) -> Vec<f32>` (a model client, a stub in
//! tests) without writing a backend type.

use super::traits::{EmbeddingBackend, EmbeddingResult};
use crate::types::Embedding;
use std::fmt;

type EmbedFn = dyn Fn(&str) -> EmbeddingResult<Embedding> + Send + Sync;

/// Embedding backend wrapping a closure
pub struct FnBackend {
    name: String,
    dimensions: usize,
    embed_fn: Box<EmbedFn>,
}

impl FnBackend {
    /// Wrap an infallible embedding function
    pub fn new<F>(dimensions: usize, f: F) -> Self
    where
        F: Fn(&str) -> Embedding + Send + Sync + 'static,
    {
        Self::fallible(dimensions, move |text| Ok(f(text)))
    }

    /// Wrap an embedding function that may fail
    pub fn fallible<F>(dimensions: usize, f: F) -> Self
    where
        F: Fn(&str) -> EmbeddingResult<Embedding> + Send + Sync + 'static,
    {
        Self {
            name: "fn".to_string(),
            dimensions,
            embed_fn: Box::new(f),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Debug for FnBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBackend")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl EmbeddingBackend for FnBackend {
    fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        (self.embed_fn)(text)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::backend::EmbeddingError;

    #[test]
    fn test_fn_backend_calls_closure() {
        let backend = FnBackend::new(2, |text| vec![text.len() as f32, 1.0]);
        assert_eq!(backend.embed("abc").unwrap(), vec![3.0, 1.0]);
        assert_eq!(backend.dimensions(), 2);
        assert_eq!(backend.name(), "fn");
    }

    #[test]
    fn test_fn_backend_propagates_errors() {
        let backend = FnBackend::fallible(2, |_| {
            Err(EmbeddingError::EmbeddingFailed("model offline".to_string()))
        })
        .with_name("flaky");
        let err = backend.embed("x").unwrap_err();
        assert!(err.to_string().contains("model offline"));
        assert_eq!(backend.name(), "flaky");
    }
}
