//! A synchronous, single-threaded dependency detector.
use super::ledger::{DetectionFailure, DetectionStage, Ledger};
use super::stats::DetectionStatistics;
use crate::analysis::{TableAnalyzer, VariableExtractor};
use crate::config::{ConfigError, DetectorConfig};
use crate::matching::{plan_lookup, unit_linkage, MatchCandidate, VariableMatch, VariableMatcher};
use crate::store::records::{Document, Equation, Table};
use crate::store::registry::ConceptRegistry;
use crate::store::relationship::{CandidateDependency, DataDependency, Provenance, RejectedDependency};
use crate::store::types::{TableColumnInfo, VariableLinkage, SCORING_METHOD};
use crate::validation::{RelationshipValidator, ValidationContext};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const DETECTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything one detection run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Accepted relationships (validation pass or warn), in equation-major order.
    pub dependencies: Vec<DataDependency>,
    pub rejected: Vec<RejectedDependency>,
    /// Every scored (variable, column) pair.
    pub candidates: Vec<MatchCandidate>,
    pub failures: Vec<DetectionFailure>,
    pub statistics: DetectionStatistics,
}

impl DetectionReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document_id: String,
    pub report: DetectionReport,
}

pub struct DependencyDetector<'r> {
    config: DetectorConfig,
    extractor: VariableExtractor<'r>,
    analyzer: TableAnalyzer<'r>,
    matcher: VariableMatcher<'r>,
    validator: RelationshipValidator<'r>,
}

impl<'r> DependencyDetector<'r> {
    /// Validates `config` and compiles its header patterns.
    pub fn new(registry: &'r ConceptRegistry, config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            extractor: VariableExtractor::new(registry),
            analyzer: TableAnalyzer::new(registry, &config)?,
            matcher: VariableMatcher::new(registry, &config),
            validator: RelationshipValidator::new(registry),
            config,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Finds every `REQUIRES_DATA_FROM` relationship between the equations and
    /// tables of one document.
    ///
    /// Variables are extracted once per equation and columns analyzed once per
    /// table; every equation is then matched against every table. A failure
    /// in one equation, table or pair is recorded and the run continues.
    pub fn detect(&self, equations: &[Equation], tables: &[Table]) -> DetectionReport {
        let span = tracing::info_span!("detect", equations = equations.len(), tables = tables.len());
        let _guard = span.enter();

        let mut ledger = Ledger::with_capacity(equations.len(), tables.len());
        let mut failures = Vec::new();

        // EXTRACT_VARIABLES
        for (idx, equation) in equations.iter().enumerate() {
            match self.extractor.try_extract(equation) {
                Ok(variables) => ledger.insert_variables(idx, variables),
                Err(e) => {
                    tracing::warn!(equation_id = %equation.equation_id, error = %e, "Skipping unreadable equation");
                    failures.push(DetectionFailure::new(
                        DetectionStage::ExtractVariables,
                        Some(&equation.equation_id),
                        None,
                        e.to_string(),
                    ));
                }
            }
        }

        // ANALYZE_COLUMNS
        for (idx, table) in tables.iter().enumerate() {
            match self.analyzer.try_analyze(table) {
                Ok(columns) => ledger.insert_columns(idx, columns),
                Err(e) => {
                    tracing::warn!(table_id = %table.table_id, error = %e, "Skipping unreadable table");
                    failures.push(DetectionFailure::new(DetectionStage::AnalyzeColumns, None, Some(&table.table_id), e.to_string()));
                }
            }
        }

        let mut dependencies = Vec::new();
        let mut rejected = Vec::new();
        let mut candidates = Vec::new();

        for (eq_idx, equation) in equations.iter().enumerate() {
            if !ledger.is_extracted(eq_idx) {
                continue;
            }
            let variables = ledger.variables(eq_idx);
            for (tbl_idx, table) in tables.iter().enumerate() {
                if !ledger.is_analyzed(tbl_idx) {
                    continue;
                }
                let columns = ledger.columns(tbl_idx);

                // MATCH
                let report = self.matcher.match_table(variables, columns);
                candidates.extend(report.candidates);
                failures.extend(report.errors.into_iter().map(|e| {
                    DetectionFailure::new(DetectionStage::Match, Some(&equation.equation_id), Some(&table.table_id), e.to_string())
                }));

                for matched in &report.matches {
                    // GENERATE_LOOKUP
                    let candidate = self.candidate(equation, table, matched, columns);
                    let ctx = ValidationContext { equation, table, variable: matched.variable, column: matched.column };

                    // VALIDATE
                    match self.validator.validate(candidate, &ctx) {
                        Ok(dependency) => {
                            tracing::debug!(
                                relationship_id = %dependency.relationship_id,
                                score = dependency.confidence.score(),
                                status = %dependency.status(),
                                "Accepted relationship"
                            );
                            dependencies.push(dependency);
                        }
                        Err(rejection) => {
                            tracing::debug!(
                                relationship_id = %rejection.relationship_id,
                                issues = ?rejection.validation.issues,
                                "Rejected relationship"
                            );
                            rejected.push(rejection);
                        }
                    }
                }
            }
        }

        // COLLECT
        let statistics = DetectionStatistics::collect(&dependencies, &rejected);
        tracing::info!(
            accepted = dependencies.len(),
            rejected = rejected.len(),
            failures = failures.len(),
            "Detection finished"
        );
        DetectionReport { dependencies, rejected, candidates, failures, statistics }
    }

    /// Runs one independent detection per document, in parallel. Reports come
    /// back in input order.
    pub fn detect_batch(&self, documents: &[Document]) -> Vec<DocumentReport> {
        documents
            .par_iter()
            .map(|document| {
                let span = tracing::info_span!("document", document_id = %document.document_id);
                let _guard = span.enter();
                DocumentReport {
                    document_id: document.document_id.clone(),
                    report: self.detect(&document.equations, &document.tables),
                }
            })
            .collect()
    }

    fn candidate(
        &self,
        equation: &Equation,
        table: &Table,
        matched: &VariableMatch<'_>,
        columns: &[TableColumnInfo],
    ) -> CandidateDependency {
        let variable = matched.variable;
        let plan = plan_lookup(matched.column, columns);
        let linkage = VariableLinkage {
            variable_id: variable.variable_id(),
            symbol: variable.symbol.clone(),
            equation_role: variable.role,
            table_column: matched.column.name.clone(),
            table_column_index: matched.column.column_index,
            lookup_method: plan.method,
            lookup_key_column: plan.key_column,
            units: unit_linkage(variable, matched.column),
            confidence: matched.confidence.clone(),
        };
        CandidateDependency {
            relationship_id: relationship_id(&equation.equation_id, &table.table_id, &variable.symbol),
            source: equation.equation_id.clone(),
            target: table.table_id.clone(),
            variable_linkage: vec![linkage],
            confidence: matched.confidence.clone(),
            provenance: Provenance {
                method: SCORING_METHOD.to_string(),
                detector_version: DETECTOR_VERSION.to_string(),
                equation_page: equation.page,
                table_page: table.page,
                equation_section: equation.section.clone(),
                table_section: table.section.clone(),
            },
        }
    }
}

/// `rel:{equation}:{table}:{symbol}`; stable across runs.
pub fn relationship_id(equation_id: &str, table_id: &str, symbol: &str) -> String {
    format!("rel:{equation_id}:{table_id}:{symbol}")
}
