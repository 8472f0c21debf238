//! Table header parsing as an ordered chain of rules; the first rule that
//! recognizes a header wins.

use crate::analysis::units::{normalize, ParsedUnit};
use crate::config::{ConfigError, DetectorConfig, UnitRewrite};
use regex::Regex;
use std::sync::LazyLock;

/// Name, symbol and units read from one header cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedHeader {
    pub name: String,
    pub symbol: Option<String>,
    pub units: Option<String>,
}

pub trait HeaderRule: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `None` when the header does not have this rule's shape.
    fn try_parse(&self, header: &str) -> Option<ParsedHeader>;
}

static COMPOUND_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<name>[^(,]+?)\s*\((?P<symbol>[^)]{1,8})\)\s*,\s*(?P<units>\S.*?)\s*$")
        .expect("compound header pattern is a valid literal")
});

/// `Name (symbol), units`, e.g. `Thermal Conductivity (k), W/m·K`.
pub struct CompoundRule;

impl HeaderRule for CompoundRule {
    fn name(&self) -> &str {
        "compound"
    }

    fn try_parse(&self, header: &str) -> Option<ParsedHeader> {
        let caps = COMPOUND_HEADER.captures(header)?;
        Some(ParsedHeader {
            name: caps.name("name")?.as_str().trim().to_string(),
            symbol: non_empty(caps.name("symbol").map(|m| m.as_str())),
            units: non_empty(caps.name("units").map(|m| m.as_str())),
        })
    }
}

/// A configured regex with a `name` group and optional `symbol`/`units` groups.
pub struct PatternRule {
    name: String,
    regex: Regex,
}

impl PatternRule {
    pub fn new(name: &str, regex: Regex) -> Self {
        Self { name: name.to_string(), regex }
    }
}

impl HeaderRule for PatternRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_parse(&self, header: &str) -> Option<ParsedHeader> {
        let caps = self.regex.captures(header)?;
        let name = caps.name("name")?.as_str().trim();
        if name.is_empty() {
            return None;
        }
        Some(ParsedHeader {
            name: name.to_string(),
            symbol: non_empty(caps.name("symbol").map(|m| m.as_str())),
            units: non_empty(caps.name("units").map(|m| m.as_str())),
        })
    }
}

/// Catch-all: a trailing parenthetical is a symbol when it is short and not a
/// number or a multi-letter unit, otherwise it is the units.
pub struct FallbackRule;

impl HeaderRule for FallbackRule {
    fn name(&self) -> &str {
        "fallback"
    }

    fn try_parse(&self, header: &str) -> Option<ParsedHeader> {
        let trimmed = header.trim();
        let (Some(open), Some(close)) = (trimmed.find('('), trimmed.rfind(')')) else {
            return Some(ParsedHeader { name: trimmed.to_string(), ..Default::default() });
        };
        if close < open {
            return Some(ParsedHeader { name: trimmed.to_string(), ..Default::default() });
        }

        let inner = trimmed[open + 1..close].trim();
        let name = format!("{} {}", trimmed[..open].trim(), trimmed[close + 1..].trim())
            .trim()
            .to_string();
        let mut parsed = ParsedHeader { name, ..Default::default() };
        if inner.is_empty() {
            return Some(parsed);
        }
        if looks_like_symbol(inner) {
            parsed.symbol = Some(inner.to_string());
        } else {
            parsed.units = Some(inner.to_string());
        }
        Some(parsed)
    }
}

fn looks_like_symbol(s: &str) -> bool {
    let len = s.chars().count();
    if len > 3 || s.parse::<f64>().is_ok() {
        return false;
    }
    // "K" may be either; "kPa" and "°C" are units.
    len == 1 || ParsedUnit::parse(s).is_err()
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// The rule chain, compiled once from configuration.
pub struct HeaderParser {
    rules: Vec<Box<dyn HeaderRule>>,
    rewrites: Vec<UnitRewrite>,
}

impl HeaderParser {
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ConfigError> {
        let mut rules: Vec<Box<dyn HeaderRule>> = vec![Box::new(CompoundRule)];
        for pattern in &config.header_patterns {
            rules.push(Box::new(PatternRule::new(&pattern.name, pattern.compile()?)));
        }
        rules.push(Box::new(FallbackRule));
        Ok(Self { rules, rewrites: config.unit_rewrites.clone() })
    }

    pub fn parse(&self, header: &str) -> ParsedHeader {
        let (rule, mut parsed) = self
            .rules
            .iter()
            .find_map(|rule| rule.try_parse(header).map(|p| (rule.name(), p)))
            .unwrap_or(("none", ParsedHeader { name: header.trim().to_string(), ..Default::default() }));
        parsed.units = parsed
            .units
            .map(|u| normalize(&u, &self.rewrites))
            .filter(|u| !u.is_empty());
        tracing::trace!(header, rule, ?parsed, "Parsed header");
        parsed
    }
}
