//! Input records produced by upstream extraction (page layout, OCR, caption
//! association). The core only reads them.

use crate::analysis::units::ParsedUnit;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// An equation recognized on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub equation_id: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub section: Option<String>,
    /// Plain symbolic form, e.g. `q = -k dT/dx`.
    pub text: String,
    /// Higher-fidelity LaTeX form when OCR produced one.
    #[serde(default)]
    pub symbolic_markup: Option<String>,
    /// Units stated for individual symbols ("where k is ... (W/m·K)").
    #[serde(default)]
    pub variable_units: BTreeMap<String, String>,
    /// The regime the equation is used in, when the document states one.
    #[serde(default)]
    pub operating_range: Option<ValidityRange>,
}

impl Equation {
    pub fn new(equation_id: &str, text: &str) -> Self {
        Self {
            equation_id: equation_id.to_string(),
            page: 0,
            section: None,
            text: text.to_string(),
            symbolic_markup: None,
            variable_units: BTreeMap::new(),
            operating_range: None,
        }
    }

    #[must_use]
    pub fn on_page(mut self, page: u32, section: Option<&str>) -> Self {
        self.page = page;
        self.section = section.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_markup(mut self, markup: &str) -> Self {
        self.symbolic_markup = Some(markup.to_string());
        self
    }

    #[must_use]
    pub fn with_variable_unit(mut self, symbol: &str, units: &str) -> Self {
        self.variable_units.insert(symbol.to_string(), units.to_string());
        self
    }

    #[must_use]
    pub fn with_operating_range(mut self, range: ValidityRange) -> Self {
        self.operating_range = Some(range);
        self
    }
}

/// A single table cell. Numbers and text both occur in extracted tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    /// Parses the cell as a number, accepting thousands separators and the
    /// Unicode minus sign in text cells.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) | Cell::Null => None,
            Cell::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| *c != ',' && *c != '\u{2009}')
                    .map(|c| if c == '−' { '-' } else { c })
                    .collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Null => String::new(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// A data table recognized on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub table_id: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub section: Option<String>,
    pub headers: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Cell>>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Documented validity range of the tabulated data.
    #[serde(default)]
    pub validity: Option<ValidityRange>,
}

impl Table {
    pub fn new(table_id: &str, headers: &[&str]) -> Self {
        Self {
            table_id: table_id.to_string(),
            page: 0,
            section: None,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            data: Vec::new(),
            caption: None,
            validity: None,
        }
    }

    #[must_use]
    pub fn on_page(mut self, page: u32, section: Option<&str>) -> Self {
        self.page = page;
        self.section = section.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        self.data.push(row);
        self
    }

    #[must_use]
    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = Some(caption.to_string());
        self
    }

    #[must_use]
    pub fn with_validity(mut self, range: ValidityRange) -> Self {
        self.validity = Some(range);
        self
    }

    /// All cells of one column, skipping rows too short to reach it.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.data.iter().filter_map(move |row| row.get(index))
    }

    /// The explicit validity range, or one stated in the caption.
    pub fn documented_range(&self) -> Option<ValidityRange> {
        self.validity
            .clone()
            .or_else(|| self.caption.as_deref().and_then(ValidityRange::from_text))
    }
}

static INEQUALITY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(-?\d+(?:\.\d+)?)\s*(°[CF]|[A-Za-z]+)?\s*(?:<=|<|≤)\s*(?P<quantity>[A-Za-zα-ωΑ-Ω_]+)\s*(?:<=|<|≤)\s*(-?\d+(?:\.\d+)?)\s*(°[CF]|[A-Za-z][A-Za-z/·²³]*)?",
    )
    .expect("inequality range pattern is a valid literal")
});

static SPAN_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:valid|range|applicable|between|from|for)\b[\s:]*(?:(?:for|over|from|between|of)\s+)*(-?\d+(?:\.\d+)?)\s*(°[CF]|[a-z][a-z/·²³]*)?\s*(?:-|–|—|to|and)\s*(-?\d+(?:\.\d+)?)\s*(°[CF]|[a-z][a-z/·²³]*)?",
    )
    .expect("span range pattern is a valid literal")
});

/// A closed numeric interval with its units. `min <= max` however it was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RangeFields")]
pub struct ValidityRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub units: Option<String>,
    /// The quantity the range constrains (symbol or name), if stated.
    #[serde(default)]
    pub quantity: Option<String>,
}

impl ValidityRange {
    pub fn new(min: f64, max: f64, units: Option<&str>) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max, units: units.map(str::to_string), quantity: None }
    }

    /// Reads a range such as `273 K < T < 373 K` or `valid for 300–1000 K`
    /// out of free text. A match whose trailing word is not a unit ("for 12
    /// metals and 4 alloys") is not a range.
    pub fn from_text(text: &str) -> Option<Self> {
        let inequality = INEQUALITY_RANGE.captures_iter(text).find_map(|caps| {
            let units = caps.get(5).or_else(|| caps.get(2)).map(|m| m.as_str());
            let mut range = Self::parsed(caps.get(1)?.as_str(), caps.get(4)?.as_str(), units, caps.get(2))?;
            range.quantity = caps.name("quantity").map(|m| m.as_str().to_string());
            Some(range)
        });
        inequality.or_else(|| {
            SPAN_RANGE.captures_iter(text).find_map(|caps| {
                let units = caps.get(4).or_else(|| caps.get(2)).map(|m| m.as_str());
                Self::parsed(caps.get(1)?.as_str(), caps.get(3)?.as_str(), units, caps.get(2))
            })
        })
    }

    fn parsed(min: &str, max: &str, units: Option<&str>, min_units: Option<regex::Match<'_>>) -> Option<Self> {
        let is_unit = |u: &str| ParsedUnit::parse(u).is_ok();
        if !units.map_or(true, is_unit) || !min_units.map_or(true, |m| is_unit(m.as_str())) {
            return None;
        }
        Some(Self::new(min.parse().ok()?, max.parse().ok()?, units))
    }
}

#[derive(Deserialize)]
struct RangeFields {
    min: f64,
    max: f64,
    #[serde(default)]
    units: Option<String>,
    #[serde(default)]
    quantity: Option<String>,
}

impl From<RangeFields> for ValidityRange {
    fn from(fields: RangeFields) -> Self {
        let mut range = Self::new(fields.min, fields.max, fields.units.as_deref());
        range.quantity = fields.quantity;
        range
    }
}

/// "where k is the thermal conductivity" — a symbol defined by an equation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub equation_id: String,
    pub symbol: String,
    pub description: String,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

/// A textual reference from one document object to another ("see Table 3").
/// Both endpoints are namespaced node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// A bibliographic citation made by a text chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub chunk_id: String,
    pub reference_key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

/// One document's extracted objects, the unit of batch detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    #[serde(default)]
    pub equations: Vec<Equation>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Cell::Number(3.5), Some(3.5))]
    #[case(Cell::from("1,250"), Some(1250.0))]
    #[case(Cell::from("−40"), Some(-40.0))]
    #[case(Cell::from(" 0.85 "), Some(0.85))]
    #[case(Cell::from("Copper"), None)]
    #[case(Cell::Null, None)]
    fn test_cell_as_number(#[case] cell: Cell, #[case] expected: Option<f64>) {
        assert_eq!(cell.as_number(), expected);
    }

    #[test]
    fn test_cells_deserialize_untagged() {
        let row: Vec<Cell> = serde_json::from_str(r#"[1.5, "Steel", null]"#).unwrap();
        assert_eq!(row, vec![Cell::Number(1.5), Cell::from("Steel"), Cell::Null]);
    }

    #[test]
    fn test_range_from_inequality() {
        let range = ValidityRange::from_text("Properties for 273 K < T < 373 K").unwrap();
        assert_eq!((range.min, range.max), (273.0, 373.0));
        assert_eq!(range.units.as_deref(), Some("K"));
        assert_eq!(range.quantity.as_deref(), Some("T"));
    }

    #[test]
    fn test_range_from_span() {
        let range = ValidityRange::from_text("Thermophysical properties, valid for 300–1000 K").unwrap();
        assert_eq!((range.min, range.max), (300.0, 1000.0));
        assert_eq!(range.units.as_deref(), Some("K"));

        let range = ValidityRange::from_text("Data range 20 to 80 °C").unwrap();
        assert_eq!((range.min, range.max), (20.0, 80.0));
        assert_eq!(range.units.as_deref(), Some("°C"));
    }

    #[rstest]
    #[case("Emissivity of common surfaces")]
    #[case("Thermal conductivity for 12 metals and 4 alloys")]
    #[case("Data for 3 fluids to 5 significant figures")]
    #[case("Values from Ref. 12 and the handbook, 3 to 4 samples")]
    fn test_no_range_in_plain_caption(#[case] caption: &str) {
        assert_eq!(ValidityRange::from_text(caption), None);
    }

    #[test]
    fn test_range_keyword_may_be_followed_by_a_preposition() {
        let range = ValidityRange::from_text("Air at atmospheric pressure, valid over 250 K to 400 K").unwrap();
        assert_eq!((range.min, range.max), (250.0, 400.0));
        assert_eq!(range.units.as_deref(), Some("K"));
    }

    #[test]
    fn test_deserialized_range_is_ordered() {
        let range: ValidityRange = serde_json::from_str(r#"{"min": 1000, "max": 300, "units": "K"}"#).unwrap();
        assert_eq!((range.min, range.max), (300.0, 1000.0));
        assert_eq!(range.units.as_deref(), Some("K"));

        let table: Table =
            serde_json::from_str(r#"{"table_id": "3", "headers": ["T"], "validity": {"min": 9, "max": -1}}"#).unwrap();
        assert_eq!(table.documented_range().map(|r| (r.min, r.max)), Some((-1.0, 9.0)));
    }

    #[test]
    fn test_documented_range_prefers_explicit() {
        let table = Table::new("3", &["T"])
            .with_caption("valid for 300-400 K")
            .with_validity(ValidityRange::new(10.0, 20.0, Some("°C")));
        assert_eq!(table.documented_range().unwrap().min, 10.0);
    }
}
