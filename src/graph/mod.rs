//! Knowledge graph of financial entities
//!
//! Built once (seeded, loaded from JSON or assembled by hand), then shared
//! read-only behind an `Arc`.

mod knowledge_graph;
mod model;
mod query;
pub mod seed;
mod snapshot;

/// Default bound on path length, in edges
pub const DEFAULT_MAX_PATH_LENGTH: usize = 4;

pub use knowledge_graph::KnowledgeGraph;
pub use model::{GraphContext, GraphEdge, GraphError, GraphNode, RelationshipType};
pub use query::{query_tokens, GraphQueryOptions};
pub use seed::financial_knowledge_graph;
pub use snapshot::{load_graph, open_configured_graph, save_graph, GraphSnapshot};
