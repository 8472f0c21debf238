//! Relationship records flowing from the detector to the graph builder.
//!
//! A `CandidateDependency` is what matching produces. Only the validation
//! gate turns it into an accepted `DataDependency` (or a `RejectedDependency`),
//! so an accepted relationship cannot exist without a verdict.

use crate::config::FactorWeights;
use crate::graph::EdgeType;
use crate::store::types::{ConfidenceScore, VariableLinkage};
use crate::validation::{ValidationResult, ValidationStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a relationship came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub method: String,
    pub detector_version: String,
    pub equation_page: u32,
    pub table_page: u32,
    pub equation_section: Option<String>,
    pub table_section: Option<String>,
}

/// A matched equation -> table pairing that has not been validated yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDependency {
    pub relationship_id: String,
    pub source: String,
    pub target: String,
    pub variable_linkage: Vec<VariableLinkage>,
    pub confidence: ConfidenceScore,
    pub provenance: Provenance,
}

/// An accepted `REQUIRES_DATA_FROM` relationship (validation pass or warn).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDependency {
    pub relationship_id: String,
    pub edge_type: EdgeType,
    /// Equation id.
    pub source: String,
    /// Table id.
    pub target: String,
    pub variable_linkage: Vec<VariableLinkage>,
    pub confidence: ConfidenceScore,
    pub validation: ValidationResult,
    pub provenance: Provenance,
}

impl DataDependency {
    pub(crate) fn accept(candidate: CandidateDependency, validation: ValidationResult) -> Self {
        Self {
            relationship_id: candidate.relationship_id,
            edge_type: EdgeType::RequiresDataFrom,
            source: candidate.source,
            target: candidate.target,
            variable_linkage: candidate.variable_linkage,
            confidence: candidate.confidence,
            validation,
            provenance: candidate.provenance,
        }
    }

    pub fn status(&self) -> ValidationStatus {
        self.validation.overall_status
    }

    /// Checks that every stored score equals the weighted sum of its factors.
    /// Dependencies read back from JSON are only trusted after this.
    pub fn check_confidence(&self, weights: &FactorWeights) -> Result<(), InconsistentConfidence> {
        let scores = std::iter::once(&self.confidence).chain(self.variable_linkage.iter().map(|l| &l.confidence));
        for confidence in scores {
            if !confidence.is_consistent_with(weights) {
                return Err(InconsistentConfidence {
                    relationship_id: self.relationship_id.clone(),
                    score: confidence.score(),
                    expected: confidence.factors.weighted_sum(weights),
                });
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Relationship '{relationship_id}' has score {score} but its factors give {expected}")]
pub struct InconsistentConfidence {
    pub relationship_id: String,
    pub score: f64,
    pub expected: f64,
}

/// A candidate dropped by the gate, kept so the reason is never lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedDependency {
    pub relationship_id: String,
    pub source: String,
    pub target: String,
    pub symbol: String,
    pub table_column: String,
    pub confidence: ConfidenceScore,
    pub validation: ValidationResult,
}

impl RejectedDependency {
    pub(crate) fn reject(candidate: CandidateDependency, validation: ValidationResult) -> Self {
        let (symbol, table_column) = candidate
            .variable_linkage
            .first()
            .map(|l| (l.symbol.clone(), l.table_column.clone()))
            .unwrap_or_default();
        Self {
            relationship_id: candidate.relationship_id,
            source: candidate.source,
            target: candidate.target,
            symbol,
            table_column,
            confidence: candidate.confidence,
            validation,
        }
    }
}
