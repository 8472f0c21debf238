//! Table column analysis: header parsing, column classification and concept
//! resolution.

use crate::analysis::error::ExtractionError;
use crate::analysis::headers::HeaderParser;
use crate::config::{ConfigError, DetectorConfig};
use crate::store::records::{Cell, Table};
use crate::store::registry::{ConceptRegistry, ResolutionContext};
use crate::store::types::{ColumnDataType, NumericRange, TableColumnInfo};
use std::collections::HashSet;

const SAMPLE_SIZE: usize = 5;
const INDEX_UNIQUE_RATIO: f64 = 0.1;
const INDEX_TEXT_SAMPLE_RATIO: f64 = 0.8;
const CATEGORICAL_NUMERIC_RATIO: f64 = 0.5;
const CONTINUOUS_UNIQUE_RATIO: f64 = 0.5;

pub struct TableAnalyzer<'r> {
    registry: &'r ConceptRegistry,
    headers: HeaderParser,
    categorical_keywords: Vec<String>,
}

impl<'r> TableAnalyzer<'r> {
    pub fn new(registry: &'r ConceptRegistry, config: &DetectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            registry,
            headers: HeaderParser::from_config(config)?,
            categorical_keywords: config.categorical_keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }

    /// Analyzes every column, logging and swallowing malformed tables.
    pub fn analyze(&self, table: &Table) -> Vec<TableColumnInfo> {
        match self.try_analyze(table) {
            Ok(columns) => columns,
            Err(e) => {
                tracing::warn!(table_id = %table.table_id, error = %e, "Skipping unreadable table");
                Vec::new()
            }
        }
    }

    pub fn try_analyze(&self, table: &Table) -> Result<Vec<TableColumnInfo>, ExtractionError> {
        if table.headers.is_empty() || table.headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ExtractionError::EmptyHeaders(table.table_id.clone()));
        }
        if let Some((row, cells)) = table
            .data
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() > table.headers.len())
        {
            return Err(ExtractionError::RaggedRow {
                table_id: table.table_id.clone(),
                row,
                cells: cells.len(),
                headers: table.headers.len(),
            });
        }

        Ok(table
            .headers
            .iter()
            .enumerate()
            .map(|(index, header)| self.analyze_column(table, index, header))
            .collect())
    }

    fn analyze_column(&self, table: &Table, column_index: usize, header: &str) -> TableColumnInfo {
        let parsed = self.headers.parse(header);
        let values: Vec<&Cell> = table.column(column_index).filter(|c| !c.is_empty()).collect();
        let stats = ColumnStats::of(&values);

        let is_index_column = self.has_categorical_keyword(&parsed.name) || stats.looks_like_index();
        let data_type = stats.data_type();

        let caption = table.caption.as_deref().unwrap_or("");
        let context_text = format!("{} {}", parsed.name, caption);
        let ctx = ResolutionContext {
            source_id: &table.table_id,
            text: &context_text,
            units: parsed.units.as_deref(),
        };
        let concept = parsed
            .symbol
            .as_deref()
            .and_then(|s| self.registry.resolve(s, &ctx))
            .or_else(|| self.registry.resolve_name(&parsed.name));

        TableColumnInfo {
            table_id: table.table_id.clone(),
            column_index,
            header_text: header.to_string(),
            name: parsed.name,
            symbol: parsed.symbol,
            units: parsed.units,
            is_index_column,
            data_type,
            canonical_id: concept.map(|c| c.canonical_id.clone()),
            sample_values: stats.sample,
            numeric_range: stats.range,
        }
    }

    fn has_categorical_keyword(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| self.categorical_keywords.iter().any(|k| k == word))
    }
}

struct ColumnStats {
    count: usize,
    numeric: usize,
    unique: usize,
    sample: Vec<String>,
    sample_text: usize,
    range: Option<NumericRange>,
}

impl ColumnStats {
    fn of(values: &[&Cell]) -> Self {
        let mut unique = HashSet::new();
        let mut numeric = 0;
        let mut range: Option<NumericRange> = None;
        for cell in values {
            unique.insert(cell.as_text());
            if let Some(n) = cell.as_number() {
                numeric += 1;
                range = Some(match range {
                    Some(r) => NumericRange { min: r.min.min(n), max: r.max.max(n) },
                    None => NumericRange { min: n, max: n },
                });
            }
        }
        let sampled = &values[..values.len().min(SAMPLE_SIZE)];
        Self {
            count: values.len(),
            numeric,
            unique: unique.len(),
            sample: sampled.iter().map(|c| c.as_text()).collect(),
            sample_text: sampled.iter().filter(|c| c.as_number().is_none()).count(),
            range,
        }
    }

    fn unique_ratio(&self) -> f64 {
        self.unique as f64 / self.count as f64
    }

    fn looks_like_index(&self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.unique_ratio() < INDEX_UNIQUE_RATIO
            || self.sample_text as f64 / self.sample.len() as f64 >= INDEX_TEXT_SAMPLE_RATIO
    }

    fn data_type(&self) -> ColumnDataType {
        if self.count == 0 {
            return ColumnDataType::Unknown;
        }
        if (self.numeric as f64 / self.count as f64) < CATEGORICAL_NUMERIC_RATIO {
            ColumnDataType::Categorical
        } else if self.unique_ratio() > CONTINUOUS_UNIQUE_RATIO {
            ColumnDataType::Continuous
        } else {
            ColumnDataType::Discrete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conductivity_table() -> Table {
        Table::new("tbl:3", &["Material", "Thermal Conductivity (k), W/m·K", "Grade"])
            .with_row(vec!["Copper".into(), 401.0.into(), 1.0.into()])
            .with_row(vec!["Aluminum".into(), 237.0.into(), 1.0.into()])
            .with_row(vec!["Steel".into(), 60.5.into(), 2.0.into()])
            .with_row(vec!["Glass".into(), 1.4.into(), 2.0.into()])
    }

    fn analyze(table: &Table) -> Vec<TableColumnInfo> {
        let registry = ConceptRegistry::standard();
        let analyzer = TableAnalyzer::new(&registry, &DetectorConfig::default()).unwrap();
        analyzer.try_analyze(table).unwrap()
    }

    #[test]
    fn test_conductivity_columns() {
        let columns = analyze(&conductivity_table());
        assert_eq!(columns.len(), 3);

        let material = &columns[0];
        assert!(material.is_index_column);
        assert_eq!(material.data_type, ColumnDataType::Categorical);
        assert_eq!(material.canonical_id, None);
        assert_eq!(material.sample_values[0], "Copper");

        let k = &columns[1];
        assert_eq!(k.symbol.as_deref(), Some("k"));
        assert_eq!(k.units.as_deref(), Some("W/m·K"));
        assert_eq!(k.canonical_id.as_deref(), Some("thermal_conductivity"));
        assert_eq!(k.data_type, ColumnDataType::Continuous);
        assert!(!k.is_index_column);
        assert_eq!(k.numeric_range, Some(NumericRange { min: 1.4, max: 401.0 }));
    }

    #[test]
    fn test_repeated_numbers_are_discrete_index() {
        let columns = analyze(&conductivity_table());
        let grade = &columns[2];
        // "grade" is a categorical keyword
        assert!(grade.is_index_column);
        assert_eq!(grade.data_type, ColumnDataType::Discrete);
    }

    #[test]
    fn test_low_unique_ratio_marks_index() {
        let mut table = Table::new("tbl:4", &["Setting", "Value"]);
        for i in 0..20 {
            table = table.with_row(vec![1.0.into(), (i as f64).into()]);
        }
        let columns = analyze(&table);
        assert!(columns[0].is_index_column);
        assert!(!columns[1].is_index_column);
    }

    #[test]
    fn test_column_resolved_by_name() {
        let table = Table::new("tbl:5", &["Emissivity, -"]).with_row(vec![0.9.into()]).with_row(vec![0.1.into()]);
        let columns = analyze(&table);
        assert_eq!(columns[0].canonical_id.as_deref(), Some("emissivity"));
    }

    #[test]
    fn test_empty_column_is_unknown() {
        let table = Table::new("tbl:6", &["Notes"]).with_row(vec![Cell::Null]);
        let columns = analyze(&table);
        assert_eq!(columns[0].data_type, ColumnDataType::Unknown);
        assert!(!columns[0].is_index_column);
    }

    #[test]
    fn test_malformed_tables_yield_no_columns() {
        let registry = ConceptRegistry::standard();
        let analyzer = TableAnalyzer::new(&registry, &DetectorConfig::default()).unwrap();

        let no_headers = Table::new("tbl:7", &[]);
        assert_eq!(analyzer.try_analyze(&no_headers), Err(ExtractionError::EmptyHeaders("tbl:7".into())));

        let ragged = Table::new("tbl:8", &["T"]).with_row(vec![1.0.into(), 2.0.into()]);
        assert!(matches!(analyzer.try_analyze(&ragged), Err(ExtractionError::RaggedRow { row: 0, .. })));
        assert!(analyzer.analyze(&ragged).is_empty());
    }
}
