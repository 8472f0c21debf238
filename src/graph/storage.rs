//! storage.rs
//! Dense node/edge layout with linked-list adjacency in both directions.

use crate::graph::{GraphEdge, GraphNode};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    pub nodes: Vec<GraphNode>,
    pub index: HashMap<String, NodeId>,

    pub edges: Vec<GraphEdge>,
    pub edge_ends: Vec<(NodeId, NodeId)>,

    // Adjacency List (Outgoing)
    pub first_out: Vec<u32>,
    pub next_out: Vec<u32>,
    // Adjacency List (Incoming)
    pub first_in: Vec<u32>,
    pub next_in: Vec<u32>,
}

impl GraphStore {
    pub fn new() -> Self { Self::default() }
    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Inserts a node unless one with the same id exists; returns its id either way.
    pub fn add_node(&mut self, node: GraphNode) -> NodeId {
        if let Some(&id) = self.index.get(&node.node_id) {
            return id;
        }
        let id = NodeId::new(self.nodes.len());
        self.index.insert(node.node_id.clone(), id);
        self.nodes.push(node);
        self.first_out.push(NIL);
        self.first_in.push(NIL);
        id
    }

    pub fn node_id(&self, node_id: &str) -> Option<NodeId> {
        self.index.get(node_id).copied()
    }

    /// Appends an edge between two stored nodes. Returns `None` if either
    /// endpoint is unknown.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Option<u32> {
        let source = self.node_id(&edge.source)?;
        let target = self.node_id(&edge.target)?;
        let e = self.edges.len() as u32;

        let head = self.first_out[source.index()];
        self.next_out.push(head);
        self.first_out[source.index()] = e;

        let head = self.first_in[target.index()];
        self.next_in.push(head);
        self.first_in[target.index()] = e;

        self.edges.push(edge);
        self.edge_ends.push((source, target));
        Some(e)
    }

    /// Outgoing edge indices in insertion order.
    pub fn outgoing(&self, id: NodeId) -> Vec<u32> {
        Self::walk(self.first_out[id.index()], &self.next_out)
    }

    /// Incoming edge indices in insertion order.
    pub fn incoming(&self, id: NodeId) -> Vec<u32> {
        Self::walk(self.first_in[id.index()], &self.next_in)
    }

    fn walk(head: u32, next: &[u32]) -> Vec<u32> {
        let mut out = Vec::new();
        let mut edge_idx = head;
        while edge_idx != NIL {
            out.push(edge_idx);
            edge_idx = next[edge_idx as usize];
        }
        // the lists are built by prepending
        out.reverse();
        out
    }
}
