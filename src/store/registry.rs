//! The concept registry: symbol -> canonical physical concept.
//!
//! Populated once before detection and read-only afterwards, so a single
//! registry can be shared by any number of concurrent detections.

use crate::analysis::error::UnitError;
use crate::analysis::units::{Dimension, ParsedUnit};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Concept '{0}' is registered twice")]
    DuplicateConcept(String),
    #[error("Concept '{canonical_id}' has no dimension and no parsable preferred unit: {source}")]
    UnknownDimension { canonical_id: String, source: UnitError },
    #[error("Failed to parse concept table: {0}")]
    Json(#[from] serde_json::Error),
}

/// One physical quantity, independent of the symbol used for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptEntry {
    pub canonical_id: String,
    /// Spelled-out name, e.g. "thermal conductivity".
    pub name: String,
    pub symbols: Vec<String>,
    pub dimension: Dimension,
    pub tags: BTreeSet<String>,
    pub preferred_units: Vec<String>,
    /// Words that select this concept when one of its symbols is overloaded.
    pub context_keywords: Vec<String>,
    pub aliases: Vec<String>,
}

/// The on-disk form of a concept; `dimension` may be omitted and is then
/// derived from the first preferred unit.
#[derive(Debug, Clone, Deserialize)]
struct ConceptRecord {
    canonical_id: String,
    name: String,
    #[serde(default)]
    symbols: Vec<String>,
    #[serde(default)]
    dimension: Option<Dimension>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    preferred_units: Vec<String>,
    #[serde(default)]
    context_keywords: Vec<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

impl ConceptEntry {
    /// Builds an entry whose dimension is derived from its preferred unit.
    pub fn from_units(
        canonical_id: &str,
        name: &str,
        symbols: &[&str],
        preferred_unit: &str,
        tags: &[&str],
    ) -> Result<Self, RegistryError> {
        let dimension = ParsedUnit::parse(preferred_unit)
            .map_err(|source| RegistryError::UnknownDimension { canonical_id: canonical_id.to_string(), source })?
            .dimension;
        Ok(Self {
            canonical_id: canonical_id.to_string(),
            name: name.to_string(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            dimension,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            preferred_units: vec![preferred_unit.to_string()],
            context_keywords: Vec::new(),
            aliases: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.context_keywords = keywords.iter().map(|s| s.to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn preferred_unit(&self) -> Option<&str> {
        self.preferred_units.first().map(String::as_str)
    }

    fn from_record(record: ConceptRecord) -> Result<Self, RegistryError> {
        let dimension = match record.dimension {
            Some(dim) => dim,
            None => {
                let unit = record.preferred_units.first().map(String::as_str).unwrap_or("");
                ParsedUnit::parse(unit)
                    .map_err(|source| RegistryError::UnknownDimension {
                        canonical_id: record.canonical_id.clone(),
                        source,
                    })?
                    .dimension
            }
        };
        Ok(Self {
            canonical_id: record.canonical_id,
            name: record.name,
            symbols: record.symbols,
            dimension,
            tags: record.tags,
            preferred_units: record.preferred_units,
            context_keywords: record.context_keywords,
            aliases: record.aliases,
        })
    }
}

/// Context used to disambiguate an overloaded symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionContext<'a> {
    /// Equation or table id the symbol was found in.
    pub source_id: &'a str,
    /// Surrounding text: the full equation, or the column name.
    pub text: &'a str,
    pub units: Option<&'a str>,
}

/// Bonus for a candidate whose dimension matches the context units; outweighs keywords.
const UNIT_MATCH_BONUS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct ConceptRegistry {
    concepts: Vec<ConceptEntry>,
    by_id: HashMap<String, usize>,
    // Candidates per symbol, in registration order.
    by_symbol: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, usize>,
}

impl ConceptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with common engineering quantities.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for entry in super::concepts::standard_concepts() {
            if let Err(e) = registry.register(entry) {
                tracing::warn!(error = %e, "Skipping built-in concept");
            }
        }
        registry
    }

    /// Loads a registry from a JSON array of concept objects.
    pub fn from_json_str(s: &str) -> Result<Self, RegistryError> {
        let records: Vec<ConceptRecord> = serde_json::from_str(s)?;
        let mut registry = Self::new();
        for record in records {
            registry.register(ConceptEntry::from_record(record)?)?;
        }
        Ok(registry)
    }

    pub fn count(&self) -> usize {
        self.concepts.len()
    }

    /// Adds a concept. A symbol shared with an earlier concept becomes an
    /// additional candidate for that symbol.
    pub fn register(&mut self, entry: ConceptEntry) -> Result<(), RegistryError> {
        if self.by_id.contains_key(&entry.canonical_id) {
            return Err(RegistryError::DuplicateConcept(entry.canonical_id));
        }
        let idx = self.concepts.len();
        self.by_id.insert(entry.canonical_id.clone(), idx);
        for symbol in &entry.symbols {
            self.by_symbol.entry(symbol.clone()).or_default().push(idx);
        }
        for name in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
            self.by_name.entry(normalize_name(name)).or_insert(idx);
        }
        self.concepts.push(entry);
        Ok(())
    }

    pub fn get(&self, canonical_id: &str) -> Option<&ConceptEntry> {
        self.by_id.get(canonical_id).map(|&i| &self.concepts[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConceptEntry> {
        self.concepts.iter()
    }

    /// Resolves a symbol to a concept, using `context` to choose between
    /// candidates of an overloaded symbol. Ties go to the first registered.
    pub fn resolve(&self, symbol: &str, context: &ResolutionContext<'_>) -> Option<&ConceptEntry> {
        let candidates = self.by_symbol.get(symbol)?;
        if candidates.len() == 1 {
            return Some(&self.concepts[candidates[0]]);
        }

        let text = context.text.to_lowercase();
        let context_dim = context
            .units
            .and_then(|u| ParsedUnit::parse(u).ok())
            .map(|u| u.dimension);

        let mut best: Option<(usize, usize)> = None;
        for &idx in candidates {
            let entry = &self.concepts[idx];
            let mut score = entry
                .context_keywords
                .iter()
                .filter(|kw| text.contains(&kw.to_lowercase()))
                .count();
            if context_dim.as_ref() == Some(&entry.dimension) {
                score += UNIT_MATCH_BONUS;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, _)| &self.concepts[idx])
    }

    /// Resolves a spelled-out name ("Thermal Conductivity") to a concept.
    /// Falls back to the longest concept name contained in `name`.
    pub fn resolve_name(&self, name: &str) -> Option<&ConceptEntry> {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return None;
        }
        if let Some(&idx) = self.by_name.get(&normalized) {
            return Some(&self.concepts[idx]);
        }

        let mut best: Option<(usize, usize)> = None;
        for (key, &idx) in &self.by_name {
            if key.len() >= 4 && contains_words(&normalized, key) {
                let better = match best {
                    None => true,
                    // Longest match wins; equal lengths fall back to registration order.
                    Some((b_idx, b_len)) => key.len() > b_len || (key.len() == b_len && idx < b_idx),
                };
                if better {
                    best = Some((idx, key.len()));
                }
            }
        }
        best.map(|(idx, _)| &self.concepts[idx])
    }
}

fn normalize_name(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if `needle` occurs in `haystack` on word boundaries.
fn contains_words(haystack: &str, needle: &str) -> bool {
    haystack == needle
        || haystack.starts_with(&format!("{needle} "))
        || haystack.ends_with(&format!(" {needle}"))
        || haystack.contains(&format!(" {needle} "))
}
