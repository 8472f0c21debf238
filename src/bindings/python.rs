use crate::config::DetectorConfig;
use crate::detection::{DependencyDetector, DETECTOR_VERSION};
use crate::graph::KnowledgeGraphBuilder;
use crate::store::{ConceptRegistry, CrossReference, DataDependency, Equation, Table};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn parse<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> PyResult<T> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("Invalid {what} JSON: {e}")))
}

/// The version recorded in every relationship's provenance.
#[pyfunction]
fn core_version() -> &'static str {
    DETECTOR_VERSION
}

/// Detects equation -> table data dependencies. Returns the detection report as JSON.
#[pyfunction]
#[pyo3(signature = (equations_json, tables_json, config_json=None))]
fn detect_dependencies(equations_json: &str, tables_json: &str, config_json: Option<&str>) -> PyResult<String> {
    let equations: Vec<Equation> = parse("equations", equations_json)?;
    let tables: Vec<Table> = parse("tables", tables_json)?;
    let config = config_from(config_json)?;

    let registry = ConceptRegistry::standard();
    let detector = DependencyDetector::new(&registry, config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    detector
        .detect(&equations, &tables)
        .to_json()
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

fn config_from(config_json: Option<&str>) -> PyResult<DetectorConfig> {
    match config_json {
        Some(json) => DetectorConfig::from_json_str(json).map_err(|e| PyValueError::new_err(e.to_string())),
        None => Ok(DetectorConfig::default()),
    }
}

/// Builds the knowledge graph from accepted dependencies (and optional
/// cross-references). Raises `ValueError` naming every dangling reference,
/// or when a dependency's score disagrees with its factors under the
/// configured weights.
#[pyfunction]
#[pyo3(signature = (dependencies_json, cross_references_json=None, config_json=None))]
fn build_graph(dependencies_json: &str, cross_references_json: Option<&str>, config_json: Option<&str>) -> PyResult<String> {
    let dependencies: Vec<DataDependency> = parse("dependencies", dependencies_json)?;
    let weights = config_from(config_json)?.weights;
    for dependency in &dependencies {
        dependency.check_confidence(&weights).map_err(|e| PyValueError::new_err(e.to_string()))?;
    }
    let references: Vec<CrossReference> = match cross_references_json {
        Some(json) => parse("cross-references", json)?,
        None => Vec::new(),
    };

    let mut builder = KnowledgeGraphBuilder::new();
    builder.add_dependencies(&dependencies);
    for reference in &references {
        builder.add_cross_reference(reference);
    }
    let graph = builder.build().map_err(|e| PyValueError::new_err(e.to_string()))?;
    graph.to_json().map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

// --- Module Definition ---
/// Defines the `docgraph._core` Python module.
#[pymodule]
fn _core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(core_version, m)?)?;
    m.add_function(wrap_pyfunction!(detect_dependencies, m)?)?;
    m.add_function(wrap_pyfunction!(build_graph, m)?)?;
    Ok(())
}
