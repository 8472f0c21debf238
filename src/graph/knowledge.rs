//! knowledge.rs
//! Wraps the low-level GraphStore with lookups, traversals and serialization.

use super::metrics::GraphMetrics;
use super::storage::{GraphStore, NodeId};
use super::{GraphEdge, GraphNode};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::{BTreeSet, VecDeque};

/// A validated knowledge graph: every edge endpoint is a node of the graph.
///
/// Only `KnowledgeGraphBuilder::build` produces one, after its integrity check.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    pub(crate) store: GraphStore,
}

impl KnowledgeGraph {
    pub(crate) fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut store = GraphStore::new();
        for node in nodes {
            store.add_node(node);
        }
        for edge in edges {
            if store.add_edge(edge).is_none() {
                tracing::error!("Edge endpoint vanished after the integrity check");
            }
        }
        Self { store }
    }

    pub fn node_count(&self) -> usize { self.store.node_count() }
    pub fn edge_count(&self) -> usize { self.store.edge_count() }

    pub fn node(&self, node_id: &str) -> Option<&GraphNode> {
        self.store.node_id(node_id).map(|id| &self.store.nodes[id.index()])
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.store.node_id(node_id).is_some()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.store.nodes.iter()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.store.edges
    }

    pub fn outgoing(&self, node_id: &str) -> Vec<&GraphEdge> {
        self.edges_of(node_id, GraphStore::outgoing)
    }

    pub fn incoming(&self, node_id: &str) -> Vec<&GraphEdge> {
        self.edges_of(node_id, GraphStore::incoming)
    }

    fn edges_of(&self, node_id: &str, adjacency: fn(&GraphStore, NodeId) -> Vec<u32>) -> Vec<&GraphEdge> {
        match self.store.node_id(node_id) {
            Some(id) => adjacency(&self.store, id)
                .into_iter()
                .map(|e| &self.store.edges[e as usize])
                .collect(),
            None => Vec::new(),
        }
    }

    // --- Graph Algorithms ---

    /// Every node reachable from `start` along outgoing edges, `start` included.
    pub fn downstream_from(&self, start: &[&str]) -> BTreeSet<String> {
        self.reachable(start, |store, id| {
            store.outgoing(id).into_iter().map(|e| store.edge_ends[e as usize].1).collect()
        })
    }

    /// Every node that reaches `start` along outgoing edges, `start` included.
    pub fn upstream_from(&self, start: &[&str]) -> BTreeSet<String> {
        self.reachable(start, |store, id| {
            store.incoming(id).into_iter().map(|e| store.edge_ends[e as usize].0).collect()
        })
    }

    fn reachable(&self, start: &[&str], neighbours: impl Fn(&GraphStore, NodeId) -> Vec<NodeId>) -> BTreeSet<String> {
        let mut visited = vec![false; self.store.node_count()];
        let mut queue: VecDeque<NodeId> = start.iter().filter_map(|s| self.store.node_id(s)).collect();
        let mut out = BTreeSet::new();

        while let Some(node) = queue.pop_front() {
            if visited[node.index()] {
                continue;
            }
            visited[node.index()] = true;
            out.insert(self.store.nodes[node.index()].node_id.clone());
            queue.extend(neighbours(&self.store, node));
        }
        out
    }

    pub fn metrics(&self) -> GraphMetrics {
        GraphMetrics::of(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for KnowledgeGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("KnowledgeGraph", 2)?;
        state.serialize_field("nodes", &self.store.nodes)?;
        state.serialize_field("edges", &self.store.edges)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, NodeType};

    fn chain() -> KnowledgeGraph {
        KnowledgeGraph::from_parts(
            vec![
                GraphNode::new(NodeType::Chunk, "1"),
                GraphNode::new(NodeType::Equation, "1"),
                GraphNode::new(NodeType::Table, "1"),
                GraphNode::new(NodeType::Figure, "1"),
            ],
            vec![
                GraphEdge::new("chunk:1", "eq:1", EdgeType::References),
                GraphEdge::new("eq:1", "tbl:1", EdgeType::RequiresDataFrom),
            ],
        )
    }

    #[test]
    fn test_lookup_and_adjacency() {
        let graph = chain();
        assert_eq!(graph.node("eq:1").unwrap().node_type, NodeType::Equation);
        assert!(graph.node("eq:2").is_none());
        assert_eq!(graph.outgoing("eq:1").len(), 1);
        assert_eq!(graph.incoming("eq:1")[0].source, "chunk:1");
        assert!(graph.outgoing("fig:1").is_empty());
    }

    #[test]
    fn test_traversals() {
        let graph = chain();
        let down: Vec<_> = graph.downstream_from(&["chunk:1"]).into_iter().collect();
        assert_eq!(down, vec!["chunk:1", "eq:1", "tbl:1"]);
        let up: Vec<_> = graph.upstream_from(&["tbl:1"]).into_iter().collect();
        assert_eq!(up, vec!["chunk:1", "eq:1", "tbl:1"]);
    }

    #[test]
    fn test_serializes_nodes_and_edges() {
        let value: serde_json::Value = serde_json::from_str(&chain().to_json().unwrap()).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(value["edges"][1]["edge_type"], "REQUIRES_DATA_FROM");
    }
}
