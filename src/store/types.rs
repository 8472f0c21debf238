use crate::config::FactorWeights;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Scoring algorithm name recorded on every `ConfidenceScore`.
pub const SCORING_METHOD: &str = "weighted_multi_factor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRole {
    Input,
    Output,
    Parameter,
}

/// A variable occurring in one equation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationVariable {
    pub equation_id: String,
    /// Full token including sub/superscripts, e.g. `c_p` or `q''`.
    pub symbol: String,
    /// The bare letter, e.g. `c`.
    pub base: String,
    pub role: VariableRole,
    pub canonical_id: Option<String>,
    pub appears_left_of_equals: bool,
    pub has_derivative: bool,
    pub in_function_argument: bool,
    pub is_greek: bool,
    pub subscripts: SmallVec<[String; 2]>,
    pub superscripts: SmallVec<[String; 2]>,
    /// Equation-side units: a stated unit for the symbol, else the concept's preferred unit.
    pub units: Option<String>,
}

impl EquationVariable {
    /// Namespaced id, shared with the knowledge graph's variable nodes.
    pub fn variable_id(&self) -> String {
        crate::graph::variable_node_id(&self.equation_id, &self.symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDataType {
    Categorical,
    Continuous,
    Discrete,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

/// A parsed table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumnInfo {
    pub table_id: String,
    pub column_index: usize,
    pub header_text: String,
    pub name: String,
    pub symbol: Option<String>,
    pub units: Option<String>,
    /// The column is a categorical lookup key (material, geometry, ...).
    pub is_index_column: bool,
    pub data_type: ColumnDataType,
    pub canonical_id: Option<String>,
    pub sample_values: Vec<String>,
    pub numeric_range: Option<NumericRange>,
}

/// The four named sub-scores of a pairing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchFactors {
    pub symbol_exact_match: f64,
    pub dimensional_consistency: f64,
    pub semantic_tag_overlap: f64,
    pub name_similarity: f64,
}

impl MatchFactors {
    pub fn weighted_sum(&self, weights: &FactorWeights) -> f64 {
        self.symbol_exact_match * weights.symbol_exact_match
            + self.dimensional_consistency * weights.dimensional_consistency
            + self.semantic_tag_overlap * weights.semantic_tag_overlap
            + self.name_similarity * weights.name_similarity
    }
}

/// A confidence score. The score is always the weighted sum of its factors:
/// the only constructor computes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    score: f64,
    pub method: String,
    pub factors: MatchFactors,
}

impl ConfidenceScore {
    pub fn weighted(factors: MatchFactors, weights: &FactorWeights) -> Self {
        Self {
            score: factors.weighted_sum(weights).clamp(0.0, 1.0),
            method: SCORING_METHOD.to_string(),
            factors,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// True when the stored score equals the weighted factor sum (e.g. after deserializing).
    pub fn is_consistent_with(&self, weights: &FactorWeights) -> bool {
        (self.score - self.factors.weighted_sum(weights)).abs() < 1e-9
    }
}

/// How a value is retrieved from the matched column at use time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupMethod {
    ExactMatch,
    LinearInterpolate,
    CategorySelect,
}

impl LookupMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupMethod::ExactMatch => "exact-match",
            LookupMethod::LinearInterpolate => "linear-interpolate",
            LookupMethod::CategorySelect => "category-select",
        }
    }
}

impl fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Units on both sides of a linkage. `table_value * factor + offset` gives the
/// value in equation units.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitLinkage {
    pub equation_units: Option<String>,
    pub table_units: Option<String>,
    pub conversion_needed: bool,
    pub conversion_factor: Option<f64>,
    pub conversion_offset: Option<f64>,
}

/// One equation variable paired with one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableLinkage {
    pub variable_id: String,
    pub symbol: String,
    pub equation_role: VariableRole,
    pub table_column: String,
    pub table_column_index: usize,
    pub lookup_method: LookupMethod,
    pub lookup_key_column: Option<String>,
    pub units: UnitLinkage,
    pub confidence: ConfidenceScore,
}
