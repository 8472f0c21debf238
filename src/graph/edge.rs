//! Defines the `GraphEdge` type, representing a typed relationship between two nodes.

use crate::validation::ValidationStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Describes the semantic type of a relationship in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// An equation introduces a variable ("where k is the thermal conductivity").
    DefinesVariable,
    /// An equation needs values tabulated in a table.
    RequiresDataFrom,
    /// The reverse of `RequiresDataFrom`.
    ProvidesDataFor,
    /// A textual cross-reference ("see Table 3").
    References,
    /// A chunk cites a bibliographic reference.
    Cites,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::DefinesVariable => "DEFINES_VARIABLE",
            EdgeType::RequiresDataFrom => "REQUIRES_DATA_FROM",
            EdgeType::ProvidesDataFor => "PROVIDES_DATA_FOR",
            EdgeType::References => "REFERENCES",
            EdgeType::Cites => "CITES",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<ValidationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    #[serde(default)]
    pub metadata: EdgeMetadata,
}

impl GraphEdge {
    pub fn new(source: &str, target: &str, edge_type: EdgeType) -> Self {
        Self { source: source.to_string(), target: target.to_string(), edge_type, metadata: EdgeMetadata::default() }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: EdgeMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_type_wire_names() {
        for edge_type in [
            EdgeType::DefinesVariable,
            EdgeType::RequiresDataFrom,
            EdgeType::ProvidesDataFor,
            EdgeType::References,
            EdgeType::Cites,
        ] {
            let json = serde_json::to_string(&edge_type).unwrap();
            assert_eq!(json, format!("\"{}\"", edge_type.as_str()));
        }
    }
}
