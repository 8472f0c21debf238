//! builder.rs
//! Accumulates nodes and typed edges from the detector's output and the
//! document's structural records, then checks referential integrity.

use super::error::{DanglingReference, GraphIntegrityError};
use super::knowledge::KnowledgeGraph;
use super::node::variable_node_id;
use super::{EdgeMetadata, EdgeType, GraphEdge, GraphNode, NodeType};
use crate::store::{Citation, CrossReference, DataDependency, Equation, Table, VariableDefinition};
use crate::validation::ValidationStatus;
use std::collections::{HashMap, HashSet};

type EdgeKey = (String, String, EdgeType, Option<String>);

#[derive(Debug, Default)]
pub struct KnowledgeGraphBuilder {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    seen_edges: HashSet<EdgeKey>,
}

impl KnowledgeGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    /// Adds `node` unless a node with the same id exists. The first
    /// registration's metadata wins. Returns the node id.
    pub fn add_node(&mut self, node: GraphNode) -> String {
        let node_id = node.node_id.clone();
        if !self.index.contains_key(&node_id) {
            self.index.insert(node_id.clone(), self.nodes.len());
            self.nodes.push(node);
        }
        node_id
    }

    /// Appends an edge. The same (source, target, type, relationship) is only stored once.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        let key = (
            edge.source.clone(),
            edge.target.clone(),
            edge.edge_type,
            edge.metadata.relationship_id.clone(),
        );
        if !self.seen_edges.insert(key) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    // --- Document objects ---

    pub fn register_equation(&mut self, equation: &Equation) -> String {
        self.add_node(
            GraphNode::new(NodeType::Equation, &equation.equation_id)
                .with_label(&equation.text)
                .at(Some(equation.page), equation.section.as_deref()),
        )
    }

    pub fn register_table(&mut self, table: &Table) -> String {
        let label = table.caption.as_deref().unwrap_or(&table.table_id);
        self.add_node(
            GraphNode::new(NodeType::Table, &table.table_id)
                .with_label(label)
                .at(Some(table.page), table.section.as_deref())
                .with_attribute("columns", table.headers.len().to_string()),
        )
    }

    pub fn register_figure(&mut self, figure_id: &str, page: Option<u32>, caption: Option<&str>) -> String {
        let mut node = GraphNode::new(NodeType::Figure, figure_id).at(page, None);
        if let Some(caption) = caption {
            node = node.with_label(caption);
        }
        self.add_node(node)
    }

    pub fn register_chunk(&mut self, chunk_id: &str, page: Option<u32>, section: Option<&str>) -> String {
        self.add_node(GraphNode::new(NodeType::Chunk, chunk_id).at(page, section))
    }

    // --- Relationships ---

    /// `eq --DEFINES_VARIABLE--> var`, creating both nodes as needed.
    pub fn add_variable_definition(&mut self, definition: &VariableDefinition) {
        let equation = self.add_node(GraphNode::new(NodeType::Equation, &definition.equation_id));
        let mut variable = GraphNode {
            node_id: variable_node_id(&definition.equation_id, &definition.symbol),
            node_type: NodeType::Variable,
            metadata: Default::default(),
        }
        .with_label(&definition.description)
        .at(definition.page, None)
        .with_attribute("symbol", definition.symbol.as_str());
        if let Some(units) = &definition.units {
            variable = variable.with_attribute("units", units.as_str());
        }
        let variable = self.add_node(variable);

        let metadata = EdgeMetadata { page: definition.page, ..Default::default() };
        self.add_edge(GraphEdge::new(&equation, &variable, EdgeType::DefinesVariable).with_metadata(metadata));
    }

    /// `eq --REQUIRES_DATA_FROM--> tbl` plus the reverse `PROVIDES_DATA_FOR`.
    ///
    /// Returns `false` when the dependency carries a `fail` verdict; such
    /// relationships never reach the graph.
    pub fn add_dependency(&mut self, dependency: &DataDependency) -> bool {
        if dependency.status() == ValidationStatus::Fail {
            tracing::warn!(
                relationship_id = %dependency.relationship_id,
                "Skipping dependency with a failing validation verdict"
            );
            return false;
        }

        let equation = self.add_node(
            GraphNode::new(NodeType::Equation, &dependency.source)
                .at(Some(dependency.provenance.equation_page), dependency.provenance.equation_section.as_deref()),
        );
        let table = self.add_node(
            GraphNode::new(NodeType::Table, &dependency.target)
                .at(Some(dependency.provenance.table_page), dependency.provenance.table_section.as_deref()),
        );

        let metadata = EdgeMetadata {
            relationship_id: Some(dependency.relationship_id.clone()),
            confidence: Some(dependency.confidence.score()),
            validation_status: Some(dependency.status()),
            page: Some(dependency.provenance.equation_page),
            section: dependency.provenance.equation_section.clone(),
            context: None,
        };
        self.add_edge(GraphEdge::new(&equation, &table, EdgeType::RequiresDataFrom).with_metadata(metadata.clone()));
        self.add_edge(GraphEdge::new(&table, &equation, EdgeType::ProvidesDataFor).with_metadata(metadata));
        true
    }

    /// Adds every dependency; returns how many were materialized.
    pub fn add_dependencies<'a>(&mut self, dependencies: impl IntoIterator<Item = &'a DataDependency>) -> usize {
        dependencies.into_iter().filter(|d| self.add_dependency(d)).count()
    }

    /// A cross-reference only contributes an edge. Its endpoints must be
    /// registered by other means or `build` reports them as dangling.
    pub fn add_cross_reference(&mut self, reference: &CrossReference) {
        let metadata = EdgeMetadata {
            page: reference.page,
            section: reference.section.clone(),
            context: reference.context.clone(),
            ..Default::default()
        };
        self.add_edge(GraphEdge::new(&reference.source, &reference.target, EdgeType::References).with_metadata(metadata));
    }

    /// `chunk --CITES--> ref`, creating both nodes as needed.
    pub fn add_citation(&mut self, citation: &Citation) {
        let chunk = self.add_node(GraphNode::new(NodeType::Chunk, &citation.chunk_id).at(citation.page, None));
        let mut reference = GraphNode::new(NodeType::Reference, &citation.reference_key);
        if let Some(title) = &citation.title {
            reference = reference.with_label(title);
        }
        let reference = self.add_node(reference);

        let metadata = EdgeMetadata { page: citation.page, ..Default::default() };
        self.add_edge(GraphEdge::new(&chunk, &reference, EdgeType::Cites).with_metadata(metadata));
    }

    /// Removes a node, leaving its edges in place.
    pub fn remove_node(&mut self, node_id: &str) -> Option<GraphNode> {
        let position = self.index.remove(node_id)?;
        let node = self.nodes.remove(position);
        self.index = self.nodes.iter().enumerate().map(|(i, n)| (n.node_id.clone(), i)).collect();
        tracing::debug!(node_id, "Removed node");
        Some(node)
    }

    /// Runs the integrity check and freezes the graph.
    ///
    /// Every edge endpoint missing from the node set is reported in the error,
    /// not just the first.
    pub fn build(self) -> Result<KnowledgeGraph, GraphIntegrityError> {
        let index = &self.index;
        let dangling: Vec<DanglingReference> = self
            .edges
            .iter()
            .enumerate()
            .flat_map(|(edge_index, edge)| {
                [&edge.source, &edge.target]
                    .into_iter()
                    .filter(move |end| !index.contains_key(end.as_str()))
                    .map(move |missing| DanglingReference {
                        edge_index,
                        edge_type: edge.edge_type,
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        missing: missing.clone(),
                    })
            })
            .collect();

        if !dangling.is_empty() {
            tracing::warn!(count = dangling.len(), "Graph integrity check failed");
            return Err(GraphIntegrityError { dangling });
        }

        tracing::info!(nodes = self.nodes.len(), edges = self.edges.len(), "Knowledge graph built");
        Ok(KnowledgeGraph::from_parts(self.nodes, self.edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FactorWeights;
    use crate::store::{ConfidenceScore, MatchFactors, Provenance};
    use crate::validation::{CheckResult, ValidationResult};

    fn dependency(status: ValidationStatus) -> DataDependency {
        let check = match status {
            ValidationStatus::Pass => CheckResult::pass("dimensional_consistency", "ok"),
            ValidationStatus::Warn => CheckResult::warn("range_applicability", "no range"),
            ValidationStatus::Fail => CheckResult::fail("dimensional_consistency", "K vs m"),
        };
        let factors = MatchFactors {
            symbol_exact_match: 1.0,
            dimensional_consistency: 1.0,
            semantic_tag_overlap: 1.0,
            name_similarity: 0.5,
        };
        DataDependency {
            relationship_id: "rel:9:3:k".to_string(),
            edge_type: EdgeType::RequiresDataFrom,
            source: "9".to_string(),
            target: "3".to_string(),
            variable_linkage: Vec::new(),
            confidence: ConfidenceScore::weighted(factors, &FactorWeights::default()),
            validation: ValidationResult::from_checks(vec![check]),
            provenance: Provenance {
                method: "weighted_multi_factor".to_string(),
                detector_version: "test".to_string(),
                equation_page: 4,
                table_page: 5,
                equation_section: Some("2.1".to_string()),
                table_section: None,
            },
        }
    }

    #[test]
    fn test_dependency_adds_edge_pair() {
        let mut builder = KnowledgeGraphBuilder::new();
        assert!(builder.add_dependency(&dependency(ValidationStatus::Warn)));
        let graph = builder.build().unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        let forward = &graph.outgoing("eq:9")[0];
        assert_eq!(forward.edge_type, EdgeType::RequiresDataFrom);
        assert_eq!(forward.target, "tbl:3");
        assert_eq!(forward.metadata.validation_status, Some(ValidationStatus::Warn));
        assert_eq!(forward.metadata.relationship_id.as_deref(), Some("rel:9:3:k"));
        assert_eq!(graph.outgoing("tbl:3")[0].edge_type, EdgeType::ProvidesDataFor);
        assert_eq!(graph.node("eq:9").unwrap().metadata.page, Some(4));
    }

    #[test]
    fn test_failing_dependency_is_skipped() {
        let mut builder = KnowledgeGraphBuilder::new();
        let added = builder.add_dependencies(&[dependency(ValidationStatus::Fail), dependency(ValidationStatus::Pass)]);
        assert_eq!(added, 1);
        assert_eq!(builder.edge_count(), 2);
    }

    #[test]
    fn test_nodes_and_edges_are_idempotent() {
        let mut builder = KnowledgeGraphBuilder::new();
        let dep = dependency(ValidationStatus::Pass);
        builder.add_dependency(&dep);
        builder.add_dependency(&dep);
        builder.register_equation(&Equation::new("9", "q = -k dT/dx"));
        assert_eq!(builder.node_count(), 2);
        assert_eq!(builder.edge_count(), 2);
    }

    #[test]
    fn test_dangling_cross_reference_names_missing_node() {
        let mut builder = KnowledgeGraphBuilder::new();
        builder.register_equation(&Equation::new("9", "q = -k dT/dx"));
        builder.add_cross_reference(&CrossReference {
            source: "eq:9".to_string(),
            target: "tbl:99".to_string(),
            page: Some(4),
            section: None,
            context: Some("see Table 99".to_string()),
        });

        let err = builder.build().unwrap_err();
        assert_eq!(err.missing_nodes(), vec!["tbl:99"]);
        assert!(err.to_string().contains("tbl:99"));
    }

    #[test]
    fn test_every_dangling_reference_is_reported() {
        let mut builder = KnowledgeGraphBuilder::new();
        builder.add_dependency(&dependency(ValidationStatus::Pass));
        builder.remove_node("tbl:3");
        let err = builder.build().unwrap_err();
        // forward edge target and reverse edge source
        assert_eq!(err.dangling.len(), 2);
        assert_eq!(err.missing_nodes(), vec!["tbl:3"]);
    }

    #[test]
    fn test_definitions_and_citations() {
        let mut builder = KnowledgeGraphBuilder::new();
        builder.add_variable_definition(&VariableDefinition {
            equation_id: "9".to_string(),
            symbol: "k".to_string(),
            description: "thermal conductivity".to_string(),
            units: Some("W/m·K".to_string()),
            page: Some(4),
        });
        builder.add_citation(&Citation {
            chunk_id: "p4-2".to_string(),
            reference_key: "incropera2007".to_string(),
            title: Some("Fundamentals of Heat and Mass Transfer".to_string()),
            page: Some(4),
        });
        let graph = builder.build().unwrap();

        let variable = graph.node("var:eq:9:k").unwrap();
        assert_eq!(variable.metadata.attributes["units"], "W/m·K");
        assert_eq!(graph.outgoing("eq:9")[0].edge_type, EdgeType::DefinesVariable);
        assert_eq!(graph.incoming("ref:incropera2007")[0].source, "chunk:p4-2");
        assert_eq!(graph.metrics().connected_components, 2);
    }
}
