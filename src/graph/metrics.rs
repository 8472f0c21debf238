//! Structural statistics of a built knowledge graph.

use super::knowledge::KnowledgeGraph;
use super::{EdgeType, NodeType};
use petgraph::algo::connected_components;
use petgraph::graph::DiGraph;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<NodeType, usize>,
    pub edges_by_type: BTreeMap<EdgeType, usize>,
    /// `E / N(N-1)`; 0 for fewer than two nodes.
    pub density: f64,
    /// `2E / N`; 0 for an empty graph.
    pub average_degree: f64,
    /// Weakly connected components.
    pub connected_components: usize,
}

impl GraphMetrics {
    pub fn of(graph: &KnowledgeGraph) -> Self {
        let n = graph.node_count();
        let e = graph.edge_count();

        let mut nodes_by_type = BTreeMap::new();
        for node in graph.nodes() {
            *nodes_by_type.entry(node.node_type).or_insert(0) += 1;
        }
        let mut edges_by_type = BTreeMap::new();
        for edge in graph.edges() {
            *edges_by_type.entry(edge.edge_type).or_insert(0) += 1;
        }

        let density = if n < 2 { 0.0 } else { e as f64 / (n as f64 * (n as f64 - 1.0)) };
        let average_degree = if n == 0 { 0.0 } else { 2.0 * e as f64 / n as f64 };

        // Mirror the topology into petgraph; its component count ignores direction.
        let store = &graph.store;
        let mut topology: DiGraph<(), ()> = DiGraph::with_capacity(n, e);
        let indices: Vec<_> = (0..n).map(|_| topology.add_node(())).collect();
        for &(source, target) in &store.edge_ends {
            topology.add_edge(indices[source.index()], indices[target.index()], ());
        }

        Self {
            node_count: n,
            edge_count: e,
            nodes_by_type,
            edges_by_type,
            density,
            average_degree,
            connected_components: connected_components(&topology),
        }
    }
}
