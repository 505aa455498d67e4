//! Knowledge graph integration tests

use finrag::graph::{
    financial_knowledge_graph, load_graph, GraphEdge, GraphError, GraphNode, GraphQueryOptions,
    GraphSnapshot, KnowledgeGraph, RelationshipType,
};
use std::sync::Arc;
use std::thread;

#[test]
fn test_financial_graph_query_end_to_end() {
    let graph = financial_knowledge_graph().unwrap();
    let ctx = graph.query("VaR and volatility?", 10);

    let ids: Vec<&str> = ctx.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["var", "volatility"]);
    assert_eq!(ctx.paths, vec![vec!["volatility", "var"]]);
    assert_eq!(ctx.edges.len(), 1);
    assert_eq!(ctx.edges[0].relationship, RelationshipType::ComponentOf);
    assert_eq!(
        ctx.description,
        "Relevant entities: Value at Risk (VaR), Volatility. \
         Relationships: Volatility component_of Value at Risk (VaR). \
         Connection paths: Volatility → Value at Risk (VaR)"
    );
}

#[test]
fn test_related_nodes_depth_one_is_direct_neighbors_only() {
    let graph = financial_knowledge_graph().unwrap();
    let ids: Vec<&str> = graph
        .find_related_nodes("interest_rate", None, 1)
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(ids, vec!["bonds", "inflation"]);

    let affects_only: Vec<&str> = graph
        .find_related_nodes("interest_rate", Some(RelationshipType::Affects), 2)
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(affects_only, vec!["bonds"]);
}

#[test]
fn test_no_path_between_unconnected_entities() {
    let graph = financial_knowledge_graph().unwrap();
    assert!(graph.find_paths("bonds", "sharpe", 3).is_empty());
    assert!(graph.find_paths("stocks", "interest_rate", 3).is_empty());
}

#[test]
fn test_description_caps_relationships_and_paths() {
    // Hub with many parallel relationships to one spoke
    let mut graph = KnowledgeGraph::new();
    graph.add_node(GraphNode::new("hub", "metric", "Hub Metric", "")).unwrap();
    graph.add_node(GraphNode::new("spoke", "metric", "Spoke Metric", "")).unwrap();
    for relationship in RelationshipType::ALL {
        graph
            .add_edge(GraphEdge::new("hub", "spoke", relationship, 0.5))
            .unwrap();
    }

    let ctx = graph.query("metric", 10);
    assert_eq!(ctx.edges.len(), 7);
    let relationships = ctx
        .description
        .split("Relationships: ")
        .nth(1)
        .and_then(|rest| rest.split(". Connection paths").next())
        .unwrap();
    assert_eq!(relationships.split("; ").count(), 5);
    // Parallel edges collapse into one node path
    assert_eq!(ctx.paths, vec![vec!["hub", "spoke"]]);
}

#[test]
fn test_query_options_control_path_collection() {
    let mut graph = KnowledgeGraph::new();
    for (id, name) in [("a", "Alpha Index"), ("b", "Beta"), ("c", "Gamma"), ("d", "Delta Index")] {
        graph.add_node(GraphNode::new(id, "indicator", name, "")).unwrap();
    }
    for (s, t) in [("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")] {
        graph
            .add_edge(GraphEdge::new(s, t, RelationshipType::Causes, 0.5))
            .unwrap();
    }

    let default_ctx = graph.query("index", 10);
    assert_eq!(default_ctx.paths, vec![vec!["a", "d"], vec!["a", "b", "c", "d"]]);

    let narrow = graph.query_with(
        "index",
        &GraphQueryOptions {
            max_nodes: 10,
            paths_per_pair: 1,
            max_path_length: 2,
            ..Default::default()
        },
    );
    assert_eq!(narrow.paths, vec![vec!["a", "d"]]);
}

#[test]
fn test_build_errors_are_reported() {
    let mut graph = KnowledgeGraph::new();
    graph.add_node(GraphNode::new("a", "metric", "A", "")).unwrap();
    assert_eq!(
        graph.add_node(GraphNode::new("a", "metric", "A again", "")),
        Err(GraphError::DuplicateNode("a".to_string()))
    );
    assert_eq!(
        graph.add_edge(GraphEdge::new("z", "a", RelationshipType::Affects, 0.5)),
        Err(GraphError::UnknownNode("z".to_string()))
    );
}

#[test]
fn test_graph_shared_across_threads() {
    let graph = Arc::new(financial_knowledge_graph().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let g = Arc::clone(&graph);
            thread::spawn(move || g.query("interest rate bonds", 10).description)
        })
        .collect();
    let descriptions: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(descriptions.windows(2).all(|w| w[0] == w[1]));
    assert!(descriptions[0].contains("Interest Rate affects Bonds"));
}

#[test]
fn test_load_graph_from_snapshot_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("graph.json");
    let snapshot = financial_knowledge_graph().unwrap().to_snapshot();
    std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

    let graph = load_graph(&path).unwrap();
    assert_eq!(graph.node_count(), 8);
    assert_eq!(graph.to_snapshot(), snapshot);

    let broken = GraphSnapshot {
        nodes: snapshot.nodes.clone(),
        edges: vec![GraphEdge::new("var", "var", RelationshipType::Causes, 2.0)],
    };
    std::fs::write(&path, serde_json::to_string(&broken).unwrap()).unwrap();
    let err = load_graph(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("outside [0, 1]"));
}
