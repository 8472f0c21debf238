//! Defines the error types for the graph module.
use super::EdgeType;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One edge endpoint that names a node missing from the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DanglingReference {
    pub edge_index: usize,
    pub edge_type: EdgeType,
    pub source: String,
    pub target: String,
    /// The endpoint that is not a node.
    pub missing: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "edge #{} ({} {} -> {}) references missing node '{}'",
            self.edge_index, self.edge_type, self.source, self.target, self.missing
        )
    }
}

/// Every dangling reference found by the integrity check, reported together.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Graph integrity check failed: {}", describe(.dangling))]
pub struct GraphIntegrityError {
    pub dangling: Vec<DanglingReference>,
}

impl GraphIntegrityError {
    /// Ids of the missing nodes, deduplicated, in first-seen order.
    pub fn missing_nodes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for d in &self.dangling {
            if !out.contains(&d.missing.as_str()) {
                out.push(&d.missing);
            }
        }
        out
    }
}

fn describe(dangling: &[DanglingReference]) -> String {
    dangling.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
