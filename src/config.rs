//! Configuration for the dependency detector.
//!
//! The configuration is an immutable value object: it is deserialized (or
//! built with the setters below), validated once by [`DetectorConfig::validate`],
//! and then only read.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Factor weights must sum to 1.0, got {0}")]
    WeightsDoNotSum(f64),
    #[error("Weight '{name}' must be within [0, 1], got {value}")]
    WeightOutOfRange { name: &'static str, value: f64 },
    #[error("Minimum confidence must be within [0, 1], got {0}")]
    MinConfidenceOutOfRange(f64),
    #[error("Header pattern '{name}' does not compile: {source}")]
    InvalidHeaderPattern { name: String, source: regex::Error },
    #[error("Header pattern '{0}' has no `name` capture group")]
    MissingNameGroup(String),
    #[error("Unit rewrite with an empty `from` string")]
    EmptyUnitRewrite,
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Weights of the four matching factors. They must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub symbol_exact_match: f64,
    pub dimensional_consistency: f64,
    pub semantic_tag_overlap: f64,
    pub name_similarity: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            symbol_exact_match: 0.40,
            dimensional_consistency: 0.30,
            semantic_tag_overlap: 0.20,
            name_similarity: 0.10,
        }
    }
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.symbol_exact_match + self.dimensional_consistency + self.semantic_tag_overlap + self.name_similarity
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("symbol_exact_match", self.symbol_exact_match),
            ("dimensional_consistency", self.dimensional_consistency),
            ("semantic_tag_overlap", self.semantic_tag_overlap),
            ("name_similarity", self.name_similarity),
        ]
    }
}

/// A literal rewrite applied to header units before whitespace normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRewrite {
    pub from: String,
    pub to: String,
}

impl UnitRewrite {
    pub fn new(from: &str, to: &str) -> Self {
        Self { from: from.to_string(), to: to.to_string() }
    }
}

/// A header parsing rule expressed as a regex with `name`, and optionally
/// `symbol` and `units`, capture groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPattern {
    pub name: String,
    pub pattern: String,
}

impl HeaderPattern {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self { name: name.to_string(), pattern: pattern.to_string() }
    }

    /// Compiles the pattern, checking that it captures at least a name.
    pub fn compile(&self) -> Result<Regex, ConfigError> {
        let regex = Regex::new(&self.pattern).map_err(|source| ConfigError::InvalidHeaderPattern {
            name: self.name.clone(),
            source,
        })?;
        if !regex.capture_names().flatten().any(|n| n == "name") {
            return Err(ConfigError::MissingNameGroup(self.name.clone()));
        }
        Ok(regex)
    }
}

/// Configuration for `DependencyDetector` behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum total score for a variable/column pairing to be accepted.
    pub min_confidence: f64,
    pub weights: FactorWeights,
    /// Header words that mark a column as a categorical lookup key.
    pub categorical_keywords: Vec<String>,
    pub unit_rewrites: Vec<UnitRewrite>,
    /// Tried in order after the compound `Name (symbol), units` rule.
    pub header_patterns: Vec<HeaderPattern>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.75,
            weights: FactorWeights::default(),
            categorical_keywords: [
                "material", "materials", "substance", "fluid", "gas", "liquid", "geometry",
                "configuration", "type", "surface", "condition", "case", "name", "description",
                "category", "class", "grade", "alloy", "finish",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            unit_rewrites: vec![
                UnitRewrite::new("deg C", "°C"),
                UnitRewrite::new("degC", "°C"),
                UnitRewrite::new("deg F", "°F"),
                UnitRewrite::new("degF", "°F"),
                UnitRewrite::new("^2", "²"),
                UnitRewrite::new("^3", "³"),
                UnitRewrite::new("m2", "m²"),
                UnitRewrite::new("m3", "m³"),
            ],
            header_patterns: vec![
                HeaderPattern::new(
                    "symbol_then_bracketed_units",
                    r"^\s*(?P<name>[^\[(,]+?)\s*\((?P<symbol>[^)]{1,6})\)\s*\[(?P<units>[^\]]+)\]\s*$",
                ),
                HeaderPattern::new("bracketed_units", r"^\s*(?P<name>[^\[]+?)\s*\[(?P<units>[^\]]+)\]\s*$"),
                HeaderPattern::new("comma_units", r"^\s*(?P<name>[^,(]+?)\s*,\s*(?P<units>[^,]+?)\s*$"),
                HeaderPattern::new("slash_units", r"^\s*(?P<name>[^/(]+?)\s+/\s+(?P<units>\S.*?)\s*$"),
            ],
        }
    }
}

impl DetectorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    #[must_use]
    pub fn weights(mut self, weights: FactorWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub fn categorical_keywords(mut self, keywords: Vec<String>) -> Self {
        self.categorical_keywords = keywords;
        self
    }

    #[must_use]
    pub fn unit_rewrites(mut self, rewrites: Vec<UnitRewrite>) -> Self {
        self.unit_rewrites = rewrites;
        self
    }

    #[must_use]
    pub fn header_patterns(mut self, patterns: Vec<HeaderPattern>) -> Self {
        self.header_patterns = patterns;
        self
    }

    /// Deserializes and validates a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks every invariant of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::MinConfidenceOutOfRange(self.min_confidence));
        }
        for (name, value) in self.weights.named() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSum(sum));
        }
        if self.unit_rewrites.iter().any(|r| r.from.is_empty()) {
            return Err(ConfigError::EmptyUnitRewrite);
        }
        for pattern in &self.header_patterns {
            pattern.compile()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.sum() - 1.0).abs() < 1e-12);
        assert_eq!(config.min_confidence, 0.75);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let config = DetectorConfig::new().weights(FactorWeights {
            symbol_exact_match: 0.5,
            ..FactorWeights::default()
        });
        assert!(matches!(config.validate(), Err(ConfigError::WeightsDoNotSum(_))));
    }

    #[test]
    fn test_min_confidence_range() {
        let config = DetectorConfig::new().min_confidence(1.5);
        assert!(matches!(config.validate(), Err(ConfigError::MinConfidenceOutOfRange(_))));
    }

    #[test]
    fn test_header_pattern_needs_name_group() {
        let config = DetectorConfig::new().header_patterns(vec![HeaderPattern::new("bad", r"^(?P<units>.+)$")]);
        assert!(matches!(config.validate(), Err(ConfigError::MissingNameGroup(n)) if n == "bad"));

        let config = DetectorConfig::new().header_patterns(vec![HeaderPattern::new("broken", r"^(?P<name>")]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHeaderPattern { .. })));
    }

    #[test]
    fn test_from_json_uses_defaults_for_missing_fields() {
        let config = DetectorConfig::from_json_str(r#"{ "min_confidence": 0.8 }"#).unwrap();
        assert_eq!(config.min_confidence, 0.8);
        assert_eq!(config.weights, FactorWeights::default());
        assert!(!config.categorical_keywords.is_empty());
    }

    #[test]
    fn test_from_json_rejects_bad_weights() {
        let json = r#"{ "weights": { "symbol_exact_match": 0.9 } }"#;
        assert!(matches!(DetectorConfig::from_json_str(json), Err(ConfigError::WeightsDoNotSum(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "categorical_keywords": ["material"] }}"#).unwrap();
        let config = DetectorConfig::from_path(file.path()).unwrap();
        assert_eq!(config.categorical_keywords, vec!["material".to_string()]);
    }
}
