//! ledger.rs
//! Per-run cache of extracted variables and analyzed columns, plus the
//! record of every failure caught along the way.

use crate::store::types::{EquationVariable, TableColumnInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The orchestrator stages a failure can be caught in, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionStage {
    ExtractVariables,
    AnalyzeColumns,
    Match,
}

impl DetectionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStage::ExtractVariables => "EXTRACT_VARIABLES",
            DetectionStage::AnalyzeColumns => "ANALYZE_COLUMNS",
            DetectionStage::Match => "MATCH",
        }
    }
}

impl fmt::Display for DetectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure caught during detection. The run continues past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFailure {
    pub stage: DetectionStage,
    pub equation_id: Option<String>,
    pub table_id: Option<String>,
    pub message: String,
}

impl DetectionFailure {
    pub fn new(stage: DetectionStage, equation_id: Option<&str>, table_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            stage,
            equation_id: equation_id.map(str::to_string),
            table_id: table_id.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Dense storage indexed by the position of the equation/table in the input.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    variables: Vec<Option<Vec<EquationVariable>>>,
    columns: Vec<Option<Vec<TableColumnInfo>>>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(equations: usize, tables: usize) -> Self {
        let mut ledger = Self::new();
        ledger.ensure_capacity(equations, tables);
        ledger
    }

    pub fn ensure_capacity(&mut self, equations: usize, tables: usize) {
        if self.variables.len() < equations {
            self.variables.resize(equations, None);
        }
        if self.columns.len() < tables {
            self.columns.resize(tables, None);
        }
    }

    pub fn is_extracted(&self, equation: usize) -> bool {
        matches!(self.variables.get(equation), Some(Some(_)))
    }

    pub fn is_analyzed(&self, table: usize) -> bool {
        matches!(self.columns.get(table), Some(Some(_)))
    }

    /// Cached variables of an equation; empty when not extracted.
    #[inline(always)]
    pub fn variables(&self, equation: usize) -> &[EquationVariable] {
        self.variables.get(equation).and_then(Option::as_deref).unwrap_or(&[])
    }

    #[inline(always)]
    pub fn columns(&self, table: usize) -> &[TableColumnInfo] {
        self.columns.get(table).and_then(Option::as_deref).unwrap_or(&[])
    }

    pub fn insert_variables(&mut self, equation: usize, variables: Vec<EquationVariable>) {
        if equation >= self.variables.len() {
            self.variables.resize(equation + 1, None);
        }
        self.variables[equation] = Some(variables);
    }

    pub fn insert_columns(&mut self, table: usize, columns: Vec<TableColumnInfo>) {
        if table >= self.columns.len() {
            self.columns.resize(table + 1, None);
        }
        self.columns[table] = Some(columns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::VariableRole;
    use smallvec::SmallVec;

    fn variable(symbol: &str) -> EquationVariable {
        EquationVariable {
            equation_id: "1".to_string(),
            symbol: symbol.to_string(),
            base: symbol.to_string(),
            role: VariableRole::Parameter,
            canonical_id: None,
            appears_left_of_equals: false,
            has_derivative: false,
            in_function_argument: false,
            is_greek: false,
            subscripts: SmallVec::new(),
            superscripts: SmallVec::new(),
            units: None,
        }
    }

    #[test]
    fn test_missing_entries_read_as_empty() {
        let ledger = Ledger::with_capacity(2, 1);
        assert!(ledger.variables(0).is_empty());
        assert!(ledger.columns(7).is_empty());
        assert!(!ledger.is_extracted(0));
    }

    #[test]
    fn test_insert_grows_storage() {
        let mut ledger = Ledger::new();
        ledger.insert_variables(3, vec![variable("k")]);
        assert!(ledger.is_extracted(3));
        assert!(!ledger.is_extracted(2));
        assert_eq!(ledger.variables(3)[0].symbol, "k");

        // an extracted equation with no variables is still cached
        ledger.insert_variables(0, Vec::new());
        assert!(ledger.is_extracted(0));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(serde_json::to_string(&DetectionStage::AnalyzeColumns).unwrap(), "\"ANALYZE_COLUMNS\"");
        assert_eq!(DetectionStage::ExtractVariables.to_string(), "EXTRACT_VARIABLES");
    }
}
