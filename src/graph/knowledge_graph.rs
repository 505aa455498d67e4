//! Financial knowledge graph: directed entity graph with typed relationships
//!
//! Nodes and edges live in a petgraph arena; a side map resolves node ids to
//! indices. Nodes and edges are never removed, so indices are stable and
//! index order is insertion order.

use super::model::{GraphEdge, GraphError, GraphNode, RelationshipType};
use super::DEFAULT_MAX_PATH_LENGTH;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Directed knowledge graph of financial entities
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    index: HashMap<String, NodeIndex>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; an existing id is rejected and the first node kept
    pub fn add_node(&mut self, node: GraphNode) -> Result<(), GraphError> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        Ok(())
    }

    /// Add an edge between two existing nodes
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<(), GraphError> {
        let from = self.node_index(&edge.source_id)?;
        let to = self.node_index(&edge.target_id)?;

        if !edge.weight.is_finite() || !(0.0..=1.0).contains(&edge.weight) {
            return Err(GraphError::InvalidWeight(edge.weight));
        }

        let duplicate = self
            .graph
            .edges_connecting(from, to)
            .any(|e| e.weight().relationship == edge.relationship);
        if duplicate {
            return Err(GraphError::DuplicateEdge {
                from: edge.source_id,
                to: edge.target_id,
                relationship: edge.relationship,
            });
        }

        self.graph.add_edge(from, to, edge);
        Ok(())
    }

    fn node_index(&self, id: &str) -> Result<NodeIndex, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights()
    }

    /// Outgoing edges of `idx` in insertion order
    ///
    /// petgraph walks adjacency lists newest first.
    fn outgoing(&self, idx: NodeIndex) -> Vec<(EdgeIndex, NodeIndex, &GraphEdge)> {
        let mut edges: Vec<_> = self
            .graph
            .edges(idx)
            .map(|e| (e.id(), e.target(), e.weight()))
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);
        edges
    }

    /// Edges from `source_id` to `target_id`, insertion order
    pub fn edges_between(&self, source_id: &str, target_id: &str) -> Vec<&GraphEdge> {
        let (Some(&from), Some(&to)) = (self.index.get(source_id), self.index.get(target_id))
        else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_connecting(from, to)
            .map(|e| (e.id(), e.weight()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, e)| e).collect()
    }

    /// Case-insensitive exact name match; first by insertion order
    pub fn find_node_by_name(&self, name: &str) -> Option<&GraphNode> {
        let wanted = name.to_lowercase();
        self.nodes().find(|n| n.name.to_lowercase() == wanted)
    }

    /// Nodes reachable from `node_id` within `max_depth` hops
    ///
    /// Breadth-first over outgoing edges, optionally following only one
    /// relationship type. The origin is excluded; order is discovery order.
    pub fn find_related_nodes(
        &self,
        node_id: &str,
        relationship: Option<RelationshipType>,
        max_depth: usize,
    ) -> Vec<&GraphNode> {
        let Some(&start) = self.index.get(node_id) else {
            return Vec::new();
        };

        let mut related = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(start);

        let mut queue = VecDeque::new();
        queue.push_back((start, 0usize));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            for (_, neighbor, edge) in self.outgoing(current) {
                if visited.contains(&neighbor) {
                    continue;
                }
                // A non-matching edge does not mark its target visited; a
                // parallel edge of the right type may still reach it.
                if relationship.is_some_and(|r| r != edge.relationship) {
                    continue;
                }

                visited.insert(neighbor);
                related.push(&self.graph[neighbor]);
                queue.push_back((neighbor, depth + 1));
            }
        }

        debug!("Related to '{}': {} nodes", node_id, related.len());
        related
    }

    /// Simple directed paths from `source_id` to `target_id`
    ///
    /// Paths have at most [`DEFAULT_MAX_PATH_LENGTH`] edges and come back
    /// shortest first. See [`Self::find_paths_within`].
    pub fn find_paths(&self, source_id: &str, target_id: &str, max_paths: usize) -> Vec<Vec<String>> {
        self.find_paths_within(source_id, target_id, max_paths, DEFAULT_MAX_PATH_LENGTH)
    }

    /// Simple directed paths of at most `max_path_length` edges
    ///
    /// Explores partial paths breadth-first, so paths are produced in
    /// non-decreasing length; equal-length paths follow edge insertion order.
    /// Empty when an endpoint is missing, no path exists, or
    /// `source_id == target_id`.
    pub fn find_paths_within(
        &self,
        source_id: &str,
        target_id: &str,
        max_paths: usize,
        max_path_length: usize,
    ) -> Vec<Vec<String>> {
        let (Some(&source), Some(&target)) = (self.index.get(source_id), self.index.get(target_id))
        else {
            return Vec::new();
        };
        if source == target || max_paths == 0 || max_path_length == 0 {
            return Vec::new();
        }

        let mut found: Vec<Vec<NodeIndex>> = Vec::new();
        let mut queue: VecDeque<Vec<NodeIndex>> = VecDeque::new();
        queue.push_back(vec![source]);

        'search: while let Some(path) = queue.pop_front() {
            let Some(&last) = path.last() else {
                continue;
            };
            // Edges so far = nodes - 1
            if path.len() > max_path_length {
                continue;
            }

            let mut seen_neighbors = HashSet::new();
            for (_, neighbor, _) in self.outgoing(last) {
                // Parallel edges lead to the same node path
                if !seen_neighbors.insert(neighbor) || path.contains(&neighbor) {
                    continue;
                }

                let mut extended = path.clone();
                extended.push(neighbor);

                if neighbor == target {
                    found.push(extended);
                    if found.len() >= max_paths {
                        break 'search;
                    }
                } else {
                    queue.push_back(extended);
                }
            }
        }

        found
            .into_iter()
            .map(|p| p.into_iter().map(|idx| self.graph[idx].id.clone()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str) -> GraphNode {
        GraphNode::new(id, "metric", name, "")
    }

    fn chain() -> KnowledgeGraph {
        // a -> b -> c -> d -> e -> f
        let mut g = KnowledgeGraph::new();
        for id in ["a", "b", "c", "d", "e", "f"] {
            g.add_node(node(id, &id.to_uppercase())).unwrap();
        }
        for (s, t) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("e", "f")] {
            g.add_edge(GraphEdge::new(s, t, RelationshipType::Affects, 0.5)).unwrap();
        }
        g
    }

    #[test]
    fn duplicate_node_rejected_first_wins() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("var", "Value at Risk")).unwrap();
        let err = g.add_node(node("var", "Other")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("var".to_string()));
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.get_node("var").unwrap().name, "Value at Risk");
    }

    #[test]
    fn edge_with_unknown_endpoint_rejected() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("a", "A")).unwrap();
        let err = g
            .add_edge(GraphEdge::new("a", "missing", RelationshipType::Causes, 0.5))
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownNode("missing".to_string()));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn edge_weight_validated() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("a", "A")).unwrap();
        g.add_node(node("b", "B")).unwrap();
        for weight in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                g.add_edge(GraphEdge::new("a", "b", RelationshipType::Affects, weight)),
                Err(GraphError::InvalidWeight(_))
            ));
        }
        g.add_edge(GraphEdge::new("a", "b", RelationshipType::Affects, 0.0)).unwrap();
        g.add_edge(GraphEdge::new("a", "b", RelationshipType::Causes, 1.0)).unwrap();
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn duplicate_edge_rejected_but_parallel_types_allowed() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("a", "A")).unwrap();
        g.add_node(node("b", "B")).unwrap();
        g.add_edge(GraphEdge::new("a", "b", RelationshipType::Affects, 0.4)).unwrap();
        g.add_edge(GraphEdge::new("a", "b", RelationshipType::CorrelatesWith, 0.6)).unwrap();
        assert!(matches!(
            g.add_edge(GraphEdge::new("a", "b", RelationshipType::Affects, 0.9)),
            Err(GraphError::DuplicateEdge { .. })
        ));

        let between = g.edges_between("a", "b");
        assert_eq!(between.len(), 2);
        assert_eq!(between[0].relationship, RelationshipType::Affects);
        assert_eq!(between[0].weight, 0.4);
        assert!(g.edges_between("b", "a").is_empty());
    }

    #[test]
    fn find_node_by_name_is_case_insensitive() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("sharpe", "Sharpe Ratio")).unwrap();
        assert_eq!(g.find_node_by_name("sharpe ratio").unwrap().id, "sharpe");
        assert!(g.find_node_by_name("sharpe").is_none());
    }

    #[test]
    fn related_nodes_respect_depth() {
        let g = chain();
        let depth1: Vec<&str> = g.find_related_nodes("a", None, 1).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(depth1, vec!["b"]);

        let depth3: Vec<&str> = g.find_related_nodes("a", None, 3).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(depth3, vec!["b", "c", "d"]);

        assert!(g.find_related_nodes("a", None, 0).is_empty());
        assert!(g.find_related_nodes("nope", None, 2).is_empty());
    }

    #[test]
    fn related_nodes_bfs_order_without_duplicates() {
        let mut g = KnowledgeGraph::new();
        for id in ["root", "x", "y", "z"] {
            g.add_node(node(id, id)).unwrap();
        }
        g.add_edge(GraphEdge::new("root", "x", RelationshipType::Affects, 0.5)).unwrap();
        g.add_edge(GraphEdge::new("root", "y", RelationshipType::Affects, 0.5)).unwrap();
        g.add_edge(GraphEdge::new("x", "z", RelationshipType::Affects, 0.5)).unwrap();
        g.add_edge(GraphEdge::new("y", "z", RelationshipType::Affects, 0.5)).unwrap();
        g.add_edge(GraphEdge::new("z", "root", RelationshipType::Affects, 0.5)).unwrap();

        let ids: Vec<&str> = g.find_related_nodes("root", None, 5).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn related_nodes_filter_by_relationship() {
        let mut g = KnowledgeGraph::new();
        for id in ["a", "b", "c"] {
            g.add_node(node(id, id)).unwrap();
        }
        g.add_edge(GraphEdge::new("a", "b", RelationshipType::Causes, 0.5)).unwrap();
        g.add_edge(GraphEdge::new("a", "c", RelationshipType::Affects, 0.5)).unwrap();
        g.add_edge(GraphEdge::new("a", "b", RelationshipType::Affects, 0.5)).unwrap();

        let ids: Vec<&str> = g
            .find_related_nodes("a", Some(RelationshipType::Affects), 2)
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        // b is reachable through the parallel AFFECTS edge
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn find_paths_shortest_first() {
        let mut g = chain();
        g.add_edge(GraphEdge::new("a", "d", RelationshipType::Causes, 0.5)).unwrap();

        let paths = g.find_paths("a", "e", 5);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], vec!["a", "d", "e"]);
        assert_eq!(paths[1], vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn find_paths_respects_length_bound() {
        let g = chain();
        // a -> f needs 5 edges, above the default bound of 4
        assert!(g.find_paths("a", "f", 3).is_empty());
        assert_eq!(g.find_paths_within("a", "f", 3, 5).len(), 1);
    }

    #[test]
    fn find_paths_negative_cases() {
        let g = chain();
        assert!(g.find_paths("e", "a", 3).is_empty());
        assert!(g.find_paths("a", "a", 3).is_empty());
        assert!(g.find_paths("a", "missing", 3).is_empty());
        assert!(g.find_paths("a", "b", 0).is_empty());
    }

    #[test]
    fn find_paths_caps_count_and_skips_cycles() {
        let mut g = KnowledgeGraph::new();
        for id in ["s", "m1", "m2", "m3", "t"] {
            g.add_node(node(id, id)).unwrap();
        }
        for mid in ["m1", "m2", "m3"] {
            g.add_edge(GraphEdge::new("s", mid, RelationshipType::Affects, 0.5)).unwrap();
            g.add_edge(GraphEdge::new(mid, "t", RelationshipType::Affects, 0.5)).unwrap();
            g.add_edge(GraphEdge::new(mid, "s", RelationshipType::Affects, 0.5)).unwrap();
        }

        let paths = g.find_paths("s", "t", 2);
        assert_eq!(paths, vec![vec!["s", "m1", "t"], vec!["s", "m2", "t"]]);
    }

    #[test]
    fn parallel_edges_yield_one_path() {
        let mut g = KnowledgeGraph::new();
        g.add_node(node("a", "A")).unwrap();
        g.add_node(node("b", "B")).unwrap();
        g.add_edge(GraphEdge::new("a", "b", RelationshipType::Affects, 0.5)).unwrap();
        g.add_edge(GraphEdge::new("a", "b", RelationshipType::Causes, 0.5)).unwrap();
        assert_eq!(g.find_paths("a", "b", 5), vec![vec!["a", "b"]]);
    }
}
