//! finrag: hybrid retrieval and knowledge-graph context for financial RAG
//!
//! - Dense retrieval (cosine over injected embeddings)
//! - BM25 lexical retrieval (Tantivy)
//! - Reciprocal Rank Fusion (RRF) and pairwise reranking
//! - A directed knowledge graph of financial entities (petgraph)

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod retrieval;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::{Result, RetrievalError};
pub use types::*;
