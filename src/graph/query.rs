//! Lexical graph queries
//!
//! A node matches when a query token appears inside its name. This is plain
//! substring matching, not entity recognition: short tokens can over-match.

use super::knowledge_graph::KnowledgeGraph;
use super::model::{GraphContext, GraphEdge, GraphNode};
use super::DEFAULT_MAX_PATH_LENGTH;
use crate::config::GraphConfig;
use crate::util::truncate_str;
use std::collections::HashSet;
use tracing::{debug, info};

/// Relationships listed in a description at most
const DESCRIBED_EDGES: usize = 5;

/// Paths listed in a description at most
const DESCRIBED_PATHS: usize = 3;

const NO_CONTEXT: &str = "No relevant context found";

/// Knobs for [`KnowledgeGraph::query_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphQueryOptions {
    pub max_nodes: usize,
    pub paths_per_pair: usize,
    pub max_path_length: usize,
    /// BFS depth for related-node expansion
    pub max_depth: usize,
    /// Paths returned by a direct path lookup
    pub max_paths: usize,
}

impl Default for GraphQueryOptions {
    fn default() -> Self {
        Self {
            max_nodes: 10,
            paths_per_pair: 2,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            max_depth: 2,
            max_paths: 3,
        }
    }
}

impl From<&GraphConfig> for GraphQueryOptions {
    fn from(config: &GraphConfig) -> Self {
        Self {
            max_nodes: config.max_nodes,
            paths_per_pair: config.paths_per_pair,
            max_path_length: config.max_path_length,
            max_depth: config.max_depth,
            max_paths: config.max_paths,
        }
    }
}

/// Lower-cased query tokens with leading/trailing punctuation removed
pub fn query_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl KnowledgeGraph {
    /// Nodes whose name contains any query token, insertion order
    pub fn match_nodes(&self, query: &str, max_nodes: usize) -> Vec<&GraphNode> {
        let tokens = query_tokens(query);
        if tokens.is_empty() {
            return Vec::new();
        }
        self.nodes()
            .filter(|node| {
                let name = node.name.to_lowercase();
                tokens.iter().any(|t| name.contains(t.as_str()))
            })
            .take(max_nodes)
            .collect()
    }

    /// Query with default options and `max_nodes` matches at most
    pub fn query(&self, query: &str, max_nodes: usize) -> GraphContext {
        self.query_with(
            query,
            &GraphQueryOptions {
                max_nodes,
                ..Default::default()
            },
        )
    }

    /// Matched nodes, the edges and paths connecting them, and a summary
    ///
    /// Each unordered pair of matches is scanned in both directions, not just
    /// from the earlier match to the later one.
    pub fn query_with(&self, query: &str, options: &GraphQueryOptions) -> GraphContext {
        info!("Graph query: '{}'", truncate_str(query, 80));

        let nodes = self.match_nodes(query, options.max_nodes);

        let mut edges: Vec<GraphEdge> = Vec::new();
        let mut paths: Vec<Vec<String>> = Vec::new();

        for (i, first) in nodes.iter().enumerate() {
            for second in &nodes[i + 1..] {
                for (from, to) in [(first, second), (second, first)] {
                    paths.extend(self.find_paths_within(
                        &from.id,
                        &to.id,
                        options.paths_per_pair,
                        options.max_path_length,
                    ));
                    edges.extend(self.edges_between(&from.id, &to.id).into_iter().cloned());
                }
            }
        }

        let description = self.describe(&nodes, &edges, &paths);
        debug!(
            "Graph query matched {} nodes, {} edges, {} paths",
            nodes.len(),
            edges.len(),
            paths.len()
        );

        GraphContext {
            nodes: nodes.into_iter().cloned().collect(),
            edges,
            paths,
            description,
        }
    }

    fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.get_node(id).map_or(id, |n| n.name.as_str())
    }

    /// Human-readable summary of a query result
    fn describe(&self, nodes: &[&GraphNode], edges: &[GraphEdge], paths: &[Vec<String>]) -> String {
        let mut parts = Vec::new();

        if !nodes.is_empty() {
            let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
            parts.push(format!("Relevant entities: {}", names.join(", ")));
        }

        if !edges.is_empty() {
            let relationships: Vec<String> = edges
                .iter()
                .take(DESCRIBED_EDGES)
                .map(|e| {
                    format!(
                        "{} {} {}",
                        self.name_of(&e.source_id),
                        e.relationship,
                        self.name_of(&e.target_id)
                    )
                })
                .collect();
            parts.push(format!("Relationships: {}", relationships.join("; ")));
        }

        if !paths.is_empty() {
            let described: Vec<String> = paths
                .iter()
                .take(DESCRIBED_PATHS)
                .map(|p| {
                    p.iter()
                        .map(|id| self.name_of(id))
                        .collect::<Vec<_>>()
                        .join(" → ")
                })
                .collect();
            parts.push(format!("Connection paths: {}", described.join("; ")));
        }

        if parts.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            parts.join(". ")
        }
    }

    /// Paths from `source_id` to `target_id` bounded by `options.max_paths`
    /// and `options.max_path_length`
    pub fn find_paths_with(
        &self,
        source_id: &str,
        target_id: &str,
        options: &GraphQueryOptions,
    ) -> Vec<Vec<String>> {
        self.find_paths_within(source_id, target_id, options.max_paths, options.max_path_length)
    }

    /// [`Self::related_context`] with `max_nodes` and `max_depth` from `options`
    pub fn related_context_with(&self, query: &str, options: &GraphQueryOptions) -> Vec<&GraphNode> {
        self.related_context(query, options.max_nodes, options.max_depth)
    }

    /// Matched nodes followed by the nodes related to each of them
    ///
    /// Deduplicated, matches first. This is the graph input handed to an
    /// answer-generation layer.
    pub fn related_context(&self, query: &str, max_nodes: usize, max_depth: usize) -> Vec<&GraphNode> {
        let matched = self.match_nodes(query, max_nodes);
        let mut seen: HashSet<&str> = matched.iter().map(|n| n.id.as_str()).collect();
        let mut context = matched.clone();

        for node in &matched {
            for related in self.find_related_nodes(&node.id, None, max_depth) {
                if seen.insert(related.id.as_str()) {
                    context.push(related);
                }
            }
        }

        context
    }
}
