//! Defines the `GraphNode` and its associated types, representing one
//! document object (equation, table, figure, ...) in the knowledge graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of document object a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Equation,
    Table,
    Figure,
    Variable,
    Reference,
    Chunk,
}

impl NodeType {
    /// The namespace prefix of ids of this type, e.g. `eq` in `eq:9`.
    pub fn prefix(&self) -> &'static str {
        match self {
            NodeType::Equation => "eq",
            NodeType::Table => "tbl",
            NodeType::Figure => "fig",
            NodeType::Variable => "var",
            NodeType::Reference => "ref",
            NodeType::Chunk => "chunk",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Equation => "equation",
            NodeType::Table => "table",
            NodeType::Figure => "figure",
            NodeType::Variable => "variable",
            NodeType::Reference => "reference",
            NodeType::Chunk => "chunk",
        };
        f.write_str(name)
    }
}

/// Contains metadata for a node, used for display and provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// A human-readable label (equation text, table caption, symbol, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub node_id: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub metadata: NodeMetadata,
}

impl GraphNode {
    /// Creates a node, namespacing `id` with the type's prefix if needed.
    pub fn new(node_type: NodeType, id: &str) -> Self {
        Self { node_id: namespaced(node_type, id), node_type, metadata: NodeMetadata::default() }
    }

    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.metadata.label = Some(label.to_string());
        self
    }

    #[must_use]
    pub fn at(mut self, page: Option<u32>, section: Option<&str>) -> Self {
        self.metadata.page = page;
        self.metadata.section = section.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// `9` -> `eq:9`; an id already carrying the prefix is returned unchanged.
pub fn namespaced(node_type: NodeType, id: &str) -> String {
    let prefix = node_type.prefix();
    match id.strip_prefix(prefix) {
        Some(rest) if rest.starts_with(':') => id.to_string(),
        _ => format!("{prefix}:{id}"),
    }
}

pub fn equation_node_id(equation_id: &str) -> String {
    namespaced(NodeType::Equation, equation_id)
}

pub fn table_node_id(table_id: &str) -> String {
    namespaced(NodeType::Table, table_id)
}

/// `var:eq:9:k`: variables are scoped to the equation that uses them.
pub fn variable_node_id(equation_id: &str, symbol: &str) -> String {
    format!("var:{}:{symbol}", equation_node_id(equation_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NodeType::Equation, "9", "eq:9")]
    #[case(NodeType::Equation, "eq:9", "eq:9")]
    #[case(NodeType::Table, "3", "tbl:3")]
    #[case(NodeType::Table, "tblx", "tbl:tblx")]
    #[case(NodeType::Chunk, "p4-2", "chunk:p4-2")]
    fn test_namespaced(#[case] node_type: NodeType, #[case] id: &str, #[case] expected: &str) {
        assert_eq!(namespaced(node_type, id), expected);
    }

    #[test]
    fn test_variable_ids_are_scoped_to_their_equation() {
        assert_eq!(variable_node_id("9", "k"), "var:eq:9:k");
        assert_eq!(variable_node_id("eq:9", "k"), "var:eq:9:k");
    }
}
