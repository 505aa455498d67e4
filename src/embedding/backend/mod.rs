//! Pluggable embedding backend system
//!
//! The retrieval core never assumes a model provider; it calls whatever
//! [`EmbeddingBackend`] it is given:
//!
//! - **HTTP backend**: OpenAI-compatible APIs (OpenAI, Azure, LM Studio, vLLM, ...)
//! - **Hash backend**: deterministic fallback without semantic meaning
//! - **Fn backend**: any closure, e.g. an in-process model or a test stub
//!
//! # Example Configuration
//!
//! ```toml
//! [embedding]
//! backend = "http"
//! endpoint = "http://localhost:1234/v1/embeddings"
//! model = "nomic-embed-text-v1.5"
//! dimensions = 768
//! ```

mod factory;
mod func;
mod hash;
mod http;
mod traits;

pub use factory::create_backend;
pub use func::FnBackend;
pub use hash::{hash_based_embedding, HashBackend};
pub use http::{HttpBackend, HttpBackendConfig};
pub use traits::{EmbeddingBackend, EmbeddingError, EmbeddingResult};
