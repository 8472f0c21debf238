//! Semantic relationship detection for technical documents.
//!
//! Equations and data tables extracted from a document are read into typed
//! variables and columns, paired by a weighted multi-factor score, passed
//! through a mandatory validation gate, and materialized into a knowledge
//! graph whose referential integrity is checked on build.
//!
//! The `python` feature adds the `_core` extension module.

// --- MODULE DECLARATIONS ---
pub mod analysis;
pub mod config;
pub mod detection;
pub mod graph;
pub mod matching;
pub mod store;
pub mod validation;

#[cfg(feature = "python")]
mod bindings {
    pub mod python;
}

// Publicly export the primary components
pub use config::{ConfigError, DetectorConfig, FactorWeights};
pub use detection::{DependencyDetector, DetectionReport, DetectionStatistics};
pub use graph::{GraphIntegrityError, GraphMetrics, KnowledgeGraph, KnowledgeGraphBuilder};
pub use store::{ConceptRegistry, DataDependency, Equation, Table};
pub use validation::{ValidationResult, ValidationStatus};
