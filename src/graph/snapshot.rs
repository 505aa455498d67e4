//! Serializable graph form for loading and saving graphs as JSON

use super::knowledge_graph::KnowledgeGraph;
use super::model::{GraphEdge, GraphError, GraphNode};
use super::seed::financial_knowledge_graph;
use crate::config::GraphConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Nodes and edges in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    /// Build a graph from a snapshot; nodes are added before edges
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in snapshot.nodes {
            graph.add_node(node)?;
        }
        for edge in snapshot.edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
        }
    }
}

/// Load a graph from a JSON snapshot file
pub fn load_graph(path: &Path) -> Result<KnowledgeGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph file '{}'", path.display()))?;
    let snapshot: GraphSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse graph file '{}'", path.display()))?;
    let graph = KnowledgeGraph::from_snapshot(snapshot)
        .with_context(|| format!("Invalid graph in '{}'", path.display()))?;

    info!(
        "Loaded graph from {}: {} nodes, {} edges",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Graph selected by `[graph]` config
///
/// A snapshot `path` wins over the built-in seed; `None` when neither is
/// configured.
pub fn open_configured_graph(config: &GraphConfig) -> Result<Option<KnowledgeGraph>> {
    if let Some(path) = &config.path {
        return load_graph(path).map(Some);
    }
    if config.seed_financial {
        let graph = financial_knowledge_graph().context("Failed to build the financial graph")?;
        return Ok(Some(graph));
    }
    Ok(None)
}

/// Write a graph as a pretty-printed JSON snapshot
pub fn save_graph(graph: &KnowledgeGraph, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&graph.to_snapshot())
        .context("Failed to serialize graph")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write graph file '{}'", path.display()))?;
    Ok(())
}
