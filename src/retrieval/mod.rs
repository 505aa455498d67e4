//! Hybrid retrieval system
//!
//! Combines:
//! - Dense search (exact cosine over injected embeddings)
//! - BM25 lexical search
//! - Reciprocal Rank Fusion (RRF) for score aggregation
//! - Reranking with an injected pairwise scorer

mod bm25;
mod cancel;
mod dense;
mod fusion;
mod hybrid;
mod reranker;
mod scorers;
mod sparse;
mod store;

pub use bm25::{tokenize, Bm25Hit, Bm25Index};
pub use cancel::{CancellationToken, QueryContext};
pub use dense::{cosine_similarity, rank_by_cosine, DenseRetriever};
pub use fusion::*;
pub use hybrid::*;
pub use reranker::*;
pub use scorers::{create_scorer, FnScorer, HttpScorer, TermOverlapScorer};
pub use sparse::SparseRetriever;
pub use store::{Corpus, DocumentStore};
