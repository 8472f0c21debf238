//! Reference data, input records and the typed data model shared by every stage.
mod concepts;
pub mod records;
pub mod registry;
pub mod relationship;
pub mod types;

pub use records::{Cell, Citation, CrossReference, Document, Equation, Table, ValidityRange, VariableDefinition};
pub use registry::{ConceptEntry, ConceptRegistry, RegistryError, ResolutionContext};
pub use relationship::{CandidateDependency, DataDependency, InconsistentConfidence, Provenance, RejectedDependency};
pub use types::*;
