//! Embedding functions consumed by dense retrieval

pub mod backend;

pub use backend::{
    create_backend, hash_based_embedding, EmbeddingBackend, EmbeddingError, EmbeddingResult,
    FnBackend, HashBackend, HttpBackend,
};
