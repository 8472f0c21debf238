//! Weighted multi-factor scoring of equation variables against table columns.

use super::error::MatchError;
use super::similarity::{expand_symbol, ratio};
use crate::analysis::latex::greek_glyph;
use crate::analysis::units::{Dimension, ParsedUnit};
use crate::analysis::UnitError;
use crate::config::{DetectorConfig, FactorWeights};
use crate::store::registry::ConceptRegistry;
use crate::store::types::{ConfidenceScore, EquationVariable, MatchFactors, TableColumnInfo};
use serde::{Deserialize, Serialize};

/// One scored (variable, column) pair, accepted or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub variable_id: String,
    pub symbol: String,
    pub table_id: String,
    pub column_index: usize,
    pub column_name: String,
    pub confidence: ConfidenceScore,
    /// Best column for the variable and above the confidence floor.
    pub accepted: bool,
}

/// The winning column for a variable.
#[derive(Debug, Clone)]
pub struct VariableMatch<'a> {
    pub variable: &'a EquationVariable,
    pub column: &'a TableColumnInfo,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Default)]
pub struct MatchReport<'a> {
    pub matches: Vec<VariableMatch<'a>>,
    pub candidates: Vec<MatchCandidate>,
    pub errors: Vec<MatchError>,
}

pub struct VariableMatcher<'r> {
    registry: &'r ConceptRegistry,
    weights: FactorWeights,
    min_confidence: f64,
}

impl<'r> VariableMatcher<'r> {
    pub fn new(registry: &'r ConceptRegistry, config: &DetectorConfig) -> Self {
        Self { registry, weights: config.weights, min_confidence: config.min_confidence }
    }

    /// The four factors of a pair. Stated units that cannot be read make the
    /// pair unscorable.
    pub fn factors(&self, variable: &EquationVariable, column: &TableColumnInfo) -> Result<MatchFactors, MatchError> {
        let malformed = |units: Option<&str>, source: UnitError| MatchError::MalformedUnits {
            units: units.unwrap_or_default().to_string(),
            symbol: variable.symbol.clone(),
            table_id: column.table_id.clone(),
            column: column.name.clone(),
            source,
        };
        let variable_dim = stated_dimension(variable.units.as_deref())
            .map_err(|e| malformed(variable.units.as_deref(), e))?;
        let column_dim = stated_dimension(column.units.as_deref())
            .map_err(|e| malformed(column.units.as_deref(), e))?;

        Ok(MatchFactors {
            symbol_exact_match: symbol_exact_match(variable, column),
            dimensional_consistency: dimensional_consistency(
                self.concept_dimension(variable.canonical_id.as_deref()).or(variable_dim),
                self.concept_dimension(column.canonical_id.as_deref()).or(column_dim),
            ),
            semantic_tag_overlap: self.semantic_tag_overlap(variable, column),
            name_similarity: ratio(&expand_symbol(&variable.symbol, &variable.base), &column.name),
        })
    }

    pub fn score(&self, variable: &EquationVariable, column: &TableColumnInfo) -> Result<ConfidenceScore, MatchError> {
        Ok(ConfidenceScore::weighted(self.factors(variable, column)?, &self.weights))
    }

    /// Scores every variable against every column of one table and keeps, per
    /// variable, the best column if it clears the confidence floor. Ties go
    /// to the column seen first.
    pub fn match_table<'a>(&self, variables: &'a [EquationVariable], columns: &'a [TableColumnInfo]) -> MatchReport<'a> {
        let mut report = MatchReport::default();
        for variable in variables {
            let mut best: Option<(usize, &'a TableColumnInfo, ConfidenceScore)> = None;
            for column in columns {
                let confidence = match self.score(variable, column) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unscorable pair");
                        report.errors.push(e);
                        continue;
                    }
                };
                let idx = report.candidates.len();
                report.candidates.push(MatchCandidate {
                    variable_id: variable.variable_id(),
                    symbol: variable.symbol.clone(),
                    table_id: column.table_id.clone(),
                    column_index: column.column_index,
                    column_name: column.name.clone(),
                    confidence: confidence.clone(),
                    accepted: false,
                });
                if best.as_ref().map_or(true, |(_, _, b)| confidence.score() > b.score()) {
                    best = Some((idx, column, confidence));
                }
            }

            if let Some((idx, column, confidence)) = best {
                if confidence.score() >= self.min_confidence {
                    report.candidates[idx].accepted = true;
                    report.matches.push(VariableMatch { variable, column, confidence });
                }
            }
        }
        report
    }

    fn concept_dimension(&self, canonical_id: Option<&str>) -> Option<Dimension> {
        canonical_id.and_then(|id| self.registry.get(id)).map(|c| c.dimension.clone())
    }

    fn semantic_tag_overlap(&self, variable: &EquationVariable, column: &TableColumnInfo) -> f64 {
        let lookup = |id: Option<&str>| id.and_then(|id| self.registry.get(id));
        let (Some(a), Some(b)) = (lookup(variable.canonical_id.as_deref()), lookup(column.canonical_id.as_deref())) else {
            return 0.0;
        };
        let union = a.tags.union(&b.tags).count();
        if union == 0 {
            return 0.0;
        }
        a.tags.intersection(&b.tags).count() as f64 / union as f64
    }
}

/// Dimension of stated units. Units outside the atom table carry no
/// information; anything else that fails to parse is an error.
fn stated_dimension(units: Option<&str>) -> Result<Option<Dimension>, UnitError> {
    match units.map(ParsedUnit::parse) {
        None | Some(Err(UnitError::UnknownUnit(_) | UnitError::Empty)) => Ok(None),
        Some(Ok(unit)) => Ok(Some(unit.dimension)),
        Some(Err(e)) => Err(e),
    }
}

fn dimensional_consistency(variable: Option<Dimension>, column: Option<Dimension>) -> f64 {
    match (variable, column) {
        (Some(a), Some(b)) if a.is_dimensionless() && b.is_dimensionless() => 0.5,
        (Some(a), Some(b)) if a == b => 1.0,
        (Some(_), Some(_)) => 0.0,
        _ => 0.5,
    }
}

fn symbol_exact_match(variable: &EquationVariable, column: &TableColumnInfo) -> f64 {
    let Some(raw) = column.symbol.as_deref() else {
        return 0.0;
    };
    // A column may spell its Greek symbol out: "Density (rho)".
    let spelled;
    let column_symbol = match greek_glyph(raw.trim()) {
        Some(glyph) => {
            spelled = glyph.to_string();
            spelled.as_str()
        }
        None => raw.trim(),
    };
    let plain_latin = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic());
    if variable.symbol == column_symbol
        || (plain_latin(&variable.symbol)
            && plain_latin(column_symbol)
            && variable.symbol.eq_ignore_ascii_case(column_symbol))
    {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::{ColumnDataType, VariableRole};
    use smallvec::SmallVec;

    fn variable(symbol: &str, canonical_id: Option<&str>, units: Option<&str>) -> EquationVariable {
        EquationVariable {
            equation_id: "eq:1".into(),
            symbol: symbol.into(),
            base: symbol.chars().next().map(String::from).unwrap_or_default(),
            role: VariableRole::Parameter,
            canonical_id: canonical_id.map(String::from),
            appears_left_of_equals: false,
            has_derivative: false,
            in_function_argument: false,
            is_greek: false,
            subscripts: SmallVec::new(),
            superscripts: SmallVec::new(),
            units: units.map(String::from),
        }
    }

    fn column(index: usize, name: &str, symbol: Option<&str>, units: Option<&str>, canonical_id: Option<&str>) -> TableColumnInfo {
        TableColumnInfo {
            table_id: "tbl:1".into(),
            column_index: index,
            header_text: name.into(),
            name: name.into(),
            symbol: symbol.map(String::from),
            units: units.map(String::from),
            is_index_column: false,
            data_type: ColumnDataType::Continuous,
            canonical_id: canonical_id.map(String::from),
            sample_values: Vec::new(),
            numeric_range: None,
        }
    }

    #[test]
    fn test_exact_symbol_and_concept_is_accepted() {
        let registry = ConceptRegistry::standard();
        let matcher = VariableMatcher::new(&registry, &DetectorConfig::default());
        let k = variable("k", Some("thermal_conductivity"), Some("W/m·K"));
        let col = column(1, "Thermal Conductivity", Some("k"), Some("W/m·K"), Some("thermal_conductivity"));

        let factors = matcher.factors(&k, &col).unwrap();
        assert_eq!(factors.symbol_exact_match, 1.0);
        assert_eq!(factors.dimensional_consistency, 1.0);
        assert_eq!(factors.semantic_tag_overlap, 1.0);

        let vars = [k];
        let cols = [col];
        let report = matcher.match_table(&vars, &cols);
        assert_eq!(report.matches.len(), 1);
        assert!(report.matches[0].confidence.score() >= 0.9);
        assert!(report.candidates[0].accepted);
    }

    #[test]
    fn test_case_insensitive_only_for_plain_latin() {
        assert_eq!(symbol_exact_match(&variable("t", None, None), &column(0, "Time", Some("T"), None, None)), 1.0);
        assert_eq!(symbol_exact_match(&variable("ε", None, None), &column(0, "E", Some("Ε"), None, None)), 0.0);
        assert_eq!(symbol_exact_match(&variable("ρ", None, None), &column(0, "Density", Some("rho"), None, None)), 1.0);
    }

    #[test]
    fn test_categorical_column_is_rejected() {
        let registry = ConceptRegistry::standard();
        let matcher = VariableMatcher::new(&registry, &DetectorConfig::default());
        let eps = variable("ε", Some("emissivity"), Some("-"));
        let material = column(0, "Material", None, None, None);

        let factors = matcher.factors(&eps, &material).unwrap();
        assert!(factors.dimensional_consistency <= 0.5);
        let vars = [eps];
        let cols = [material];
        let report = matcher.match_table(&vars, &cols);
        assert!(report.matches.is_empty());
        assert_eq!(report.candidates.len(), 1);
        assert!(report.candidates[0].confidence.score() < 0.75);
    }

    #[test]
    fn test_dimension_mismatch_scores_zero() {
        let registry = ConceptRegistry::standard();
        let matcher = VariableMatcher::new(&registry, &DetectorConfig::default());
        let k = variable("k", Some("thermal_conductivity"), None);
        let col = column(0, "Spring rate", Some("k"), Some("N/m"), None);
        assert_eq!(matcher.factors(&k, &col).unwrap().dimensional_consistency, 0.0);
    }

    #[test]
    fn test_tie_goes_to_first_column() {
        let registry = ConceptRegistry::standard();
        let matcher = VariableMatcher::new(&registry, &DetectorConfig::default());
        let t = variable("T", Some("temperature"), Some("K"));
        let cols = [
            column(0, "Temperature", Some("T"), Some("K"), Some("temperature")),
            column(1, "Temperature", Some("T"), Some("K"), Some("temperature")),
        ];
        let vars = [t];
        let report = matcher.match_table(&vars, &cols);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].column.column_index, 0);
        assert!(report.candidates[0].accepted);
        assert!(!report.candidates[1].accepted);
    }

    #[test]
    fn test_malformed_units_skip_only_their_pair() {
        let registry = ConceptRegistry::standard();
        let matcher = VariableMatcher::new(&registry, &DetectorConfig::default());
        let k = variable("k", Some("thermal_conductivity"), None);
        let cols = [
            column(0, "Stiffness", Some("s"), Some("W^1500000000"), None),
            column(1, "Thermal Conductivity", Some("k"), Some("W/m·K"), Some("thermal_conductivity")),
        ];
        let vars = [k];
        let report = matcher.match_table(&vars, &cols);

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            MatchError::MalformedUnits { column, source: UnitError::InvalidExponent(_), .. } if column == "Stiffness"
        ));
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].column.column_index, 1);
    }

    #[test]
    fn test_unknown_units_carry_no_dimension() {
        let registry = ConceptRegistry::standard();
        let matcher = VariableMatcher::new(&registry, &DetectorConfig::default());
        let x = variable("x", None, Some("furlong"));
        let col = column(0, "Distance", Some("x"), Some("m"), None);
        assert_eq!(matcher.factors(&x, &col).unwrap().dimensional_consistency, 0.5);
    }
}
