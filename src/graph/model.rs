//! Knowledge graph value types

use crate::types::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relationship between two financial entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Affects,
    CorrelatesWith,
    ComponentOf,
    DerivedFrom,
    InverseOf,
    Causes,
    Influences,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 7] = [
        Self::Affects,
        Self::CorrelatesWith,
        Self::ComponentOf,
        Self::DerivedFrom,
        Self::InverseOf,
        Self::Causes,
        Self::Influences,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Affects => "affects",
            Self::CorrelatesWith => "correlates_with",
            Self::ComponentOf => "component_of",
            Self::DerivedFrom => "derived_from",
            Self::InverseOf => "inverse_of",
            Self::Causes => "causes",
            Self::Influences => "influences",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    /// Accepts `component_of`, `COMPONENT_OF` and `component-of`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| format!("unknown relationship type '{}'", s))
    }
}

/// An entity in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(alias = "node_id")]
    pub id: String,
    /// e.g. "metric", "asset", "economic_indicator"
    pub entity_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GraphNode {
    pub fn new(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            name: name.into(),
            description: description.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Directed, weighted relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    pub relationship: RelationshipType,
    /// Strength of the relationship, in [0, 1]
    pub weight: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GraphEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship: RelationshipType,
        weight: f32,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship,
            weight,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Graph context returned for a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphContext {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Node-id paths between matched entities
    pub paths: Vec<Vec<String>>,
    pub description: String,
}

impl GraphContext {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Errors raised while building a graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("node '{0}' already exists")]
    DuplicateNode(String),

    #[error("edge endpoint '{0}' is not in the graph")]
    UnknownNode(String),

    #[error("edge weight {0} is outside [0, 1]")]
    InvalidWeight(f32),

    #[error("edge {from} -[{relationship}]-> {to} already exists")]
    DuplicateEdge {
        from: String,
        to: String,
        relationship: RelationshipType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_parses_and_displays() {
        assert_eq!("COMPONENT_OF".parse::<RelationshipType>().unwrap(), RelationshipType::ComponentOf);
        assert_eq!("correlates-with".parse::<RelationshipType>().unwrap(), RelationshipType::CorrelatesWith);
        assert!("unrelated".parse::<RelationshipType>().is_err());
        assert_eq!(RelationshipType::InverseOf.to_string(), "inverse_of");
    }

    #[test]
    fn relationship_serializes_snake_case() {
        let json = serde_json::to_string(&RelationshipType::DerivedFrom).unwrap();
        assert_eq!(json, "\"derived_from\"");
    }

    #[test]
    fn node_accepts_node_id_alias() {
        let node: GraphNode = serde_json::from_str(
            r#"{"node_id": "var", "entity_type": "metric", "name": "Value at Risk (VaR)"}"#,
        )
        .unwrap();
        assert_eq!(node.id, "var");
        assert!(node.description.is_empty());
    }
}
