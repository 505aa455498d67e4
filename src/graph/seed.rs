//! Built-in starter graph of common financial relationships

use super::knowledge_graph::KnowledgeGraph;
use super::model::{GraphEdge, GraphError, GraphNode, RelationshipType};
use serde_json::json;
use tracing::info;

fn metric(id: &str, name: &str, description: &str, formula: &str, category: &str) -> GraphNode {
    GraphNode::new(id, "metric", name, description)
        .with_metadata("formula", json!(formula))
        .with_metadata("category", json!(category))
}

fn entity(id: &str, entity_type: &str, name: &str, description: &str, category: &str) -> GraphNode {
    GraphNode::new(id, entity_type, name, description).with_metadata("category", json!(category))
}

fn relation(
    source: &str,
    target: &str,
    relationship: RelationshipType,
    weight: f32,
    description: &str,
) -> GraphEdge {
    GraphEdge::new(source, target, relationship, weight).with_metadata("description", json!(description))
}

/// Risk metrics, economic indicators and asset classes with their links
pub fn financial_knowledge_graph() -> Result<KnowledgeGraph, GraphError> {
    let mut graph = KnowledgeGraph::new();

    // Risk and performance metrics
    graph.add_node(metric(
        "var",
        "Value at Risk (VaR)",
        "Maximum expected loss at a confidence level",
        "Formula 12",
        "risk",
    ))?;
    graph.add_node(metric(
        "volatility",
        "Volatility",
        "Standard deviation of returns",
        "Formula 5",
        "risk",
    ))?;
    graph.add_node(metric(
        "sortino",
        "Sortino Ratio",
        "Risk-adjusted return using downside deviation",
        "Formula 11",
        "performance",
    ))?;
    graph.add_node(metric(
        "sharpe",
        "Sharpe Ratio",
        "Risk-adjusted return using total volatility",
        "Formula 6",
        "performance",
    ))?;

    // Economic indicators
    graph.add_node(entity(
        "interest_rate",
        "economic_indicator",
        "Interest Rate",
        "Federal Reserve interest rate",
        "monetary_policy",
    ))?;
    graph.add_node(entity(
        "inflation",
        "economic_indicator",
        "Inflation",
        "Rate of price increases",
        "economic",
    ))?;

    // Assets
    graph.add_node(entity("bonds", "asset", "Bonds", "Fixed income securities", "fixed_income"))?;
    graph.add_node(entity("stocks", "asset", "Stocks", "Equity securities", "equity"))?;

    graph.add_edge(relation(
        "volatility",
        "var",
        RelationshipType::ComponentOf,
        0.9,
        "Volatility is a key input to VaR calculation",
    ))?;
    graph.add_edge(relation(
        "volatility",
        "sharpe",
        RelationshipType::ComponentOf,
        1.0,
        "Sharpe Ratio uses total volatility",
    ))?;
    graph.add_edge(relation(
        "interest_rate",
        "bonds",
        RelationshipType::Affects,
        0.95,
        "Interest rates inversely affect bond prices",
    ))?;
    graph.add_edge(relation(
        "interest_rate",
        "inflation",
        RelationshipType::Influences,
        0.85,
        "Central banks use rates to control inflation",
    ))?;
    graph.add_edge(relation(
        "inflation",
        "stocks",
        RelationshipType::Affects,
        0.7,
        "Inflation affects corporate earnings and valuations",
    ))?;

    info!(
        "Financial knowledge graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}
