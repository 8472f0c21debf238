//! Defines the knowledge graph: typed document-object nodes, typed edges,
//! the builder with its integrity check, and graph metrics.
pub mod builder;
pub mod edge;
pub mod error;
pub mod knowledge;
pub mod metrics;
pub mod node;
pub mod storage;

// Re-export key types for convenient access
pub use builder::KnowledgeGraphBuilder;
pub use edge::{EdgeMetadata, EdgeType, GraphEdge};
pub use error::{DanglingReference, GraphIntegrityError};
pub use knowledge::KnowledgeGraph;
pub use metrics::GraphMetrics;
pub use node::{equation_node_id, namespaced, table_node_id, variable_node_id, GraphNode, NodeMetadata, NodeType};
pub use storage::NodeId;
