//! Dimensional analysis for engineering unit strings.
//!
//! A unit such as `W/m·K` is parsed into a [`ParsedUnit`]: the exponent of each
//! SI base dimension plus the scale factor (and, for affine temperature scales,
//! the offset) that takes a value in that unit to SI.

use crate::analysis::error::UnitError;
use crate::config::UnitRewrite;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Largest exponent magnitude a unit or dimension may carry.
pub const MAX_EXPONENT: i32 = 32;

/// The seven SI base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseDimension {
    Length,
    Mass,
    Time,
    Temperature,
    Current,
    Amount,
    Luminosity,
}

impl BaseDimension {
    pub fn symbol(&self) -> &'static str {
        match self {
            BaseDimension::Length => "L",
            BaseDimension::Mass => "M",
            BaseDimension::Time => "T",
            BaseDimension::Temperature => "Θ",
            BaseDimension::Current => "I",
            BaseDimension::Amount => "N",
            BaseDimension::Luminosity => "J",
        }
    }

    fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "L" => Some(BaseDimension::Length),
            "M" => Some(BaseDimension::Mass),
            "T" => Some(BaseDimension::Time),
            "Θ" | "K" => Some(BaseDimension::Temperature),
            "I" => Some(BaseDimension::Current),
            "N" => Some(BaseDimension::Amount),
            "J" => Some(BaseDimension::Luminosity),
            _ => None,
        }
    }
}

/// A physical dimension, mapping each base dimension to its exponent.
/// Example: thermal conductivity `W/m·K` -> { L: 1, M: 1, T: -3, Θ: -1 }
///
/// Serializes as a descriptor string (`"L*M/T^3*Θ"`) or `"dimensionless"`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Dimension {
    terms: BTreeMap<BaseDimension, i32>,
}

impl Dimension {
    pub fn dimensionless() -> Self {
        Self::default()
    }

    pub fn base(base: BaseDimension) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(base, 1);
        Self { terms }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.terms.values().all(|&exp| exp == 0)
    }

    pub fn exponent(&self, base: BaseDimension) -> i32 {
        self.terms.get(&base).copied().unwrap_or(0)
    }

    /// Merges another dimension into this one, effectively multiplying them.
    pub fn multiply_by(&mut self, other: &Self) -> Result<(), UnitError> {
        self.combine(other, i32::checked_add)
    }

    /// Merges another dimension into this one, effectively dividing by it.
    pub fn divide_by(&mut self, other: &Self) -> Result<(), UnitError> {
        self.combine(other, i32::checked_sub)
    }

    /// Leaves `self` untouched when any resulting exponent is out of range.
    fn combine(&mut self, other: &Self, op: fn(i32, i32) -> Option<i32>) -> Result<(), UnitError> {
        let mut terms = self.terms.clone();
        for (base, exponent) in &other.terms {
            let entry = terms.entry(*base).or_insert(0);
            *entry = op(*entry, *exponent)
                .filter(in_exponent_range)
                .ok_or(UnitError::ExponentOverflow(*base))?;
        }
        terms.retain(|_, exp| *exp != 0);
        self.terms = terms;
        Ok(())
    }

    pub fn powi(&self, power: i32) -> Result<Self, UnitError> {
        let mut terms = BTreeMap::new();
        for (base, exp) in &self.terms {
            let exp = exp
                .checked_mul(power)
                .filter(in_exponent_range)
                .ok_or(UnitError::ExponentOverflow(*base))?;
            if exp != 0 {
                terms.insert(*base, exp);
            }
        }
        Ok(Self { terms })
    }

    /// Parses a descriptor in the `num*num/den*den` form produced by `Display`.
    pub fn parse_descriptor(s: &str) -> Result<Self, UnitError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UnitError::Empty);
        }
        if s.eq_ignore_ascii_case("dimensionless") || s == "1" {
            return Ok(Self::dimensionless());
        }

        let mut dim = Self::default();
        let mut parts = s.split('/');
        if let Some(num) = parts.next() {
            Self::parse_product(num, 1, &mut dim)?;
        }
        if let Some(den) = parts.next() {
            Self::parse_product(den, -1, &mut dim)?;
        }
        if parts.next().is_some() {
            return Err(UnitError::MultipleDivisions(s.to_string()));
        }
        Ok(dim)
    }

    fn parse_product(product: &str, sign: i32, dim: &mut Self) -> Result<(), UnitError> {
        if product.trim().is_empty() || product.trim() == "1" {
            return Ok(());
        }
        for factor in product.split('*') {
            let mut factor_parts = factor.split('^');
            let base_str = factor_parts.next().unwrap_or_default().trim();
            let base = BaseDimension::from_symbol(base_str)
                .ok_or_else(|| UnitError::UnknownUnit(base_str.to_string()))?;
            let exponent = match factor_parts.next() {
                Some(exp) => bounded_exponent(exp.trim(), factor)?,
                None => 1,
            };
            let mut single = BTreeMap::new();
            single.insert(base, exponent * sign);
            dim.multiply_by(&Self { terms: single })?;
        }
        Ok(())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("dimensionless");
        }
        // Partition terms into numerator (exp > 0) and denominator (exp < 0).
        let (num_terms, den_terms): (Vec<_>, Vec<_>) =
            self.terms.iter().filter(|&(_, &exp)| exp != 0).partition(|&(_, &exp)| exp > 0);

        let format_product = |terms: Vec<(&BaseDimension, &i32)>| -> String {
            if terms.is_empty() {
                return "1".to_string();
            }
            terms
                .into_iter()
                .map(|(base, exp)| {
                    if exp.abs() == 1 {
                        base.symbol().to_string()
                    } else {
                        format!("{}^{}", base.symbol(), exp.abs())
                    }
                })
                .collect::<Vec<_>>()
                .join("*")
        };

        let num = format_product(num_terms);
        if den_terms.is_empty() {
            f.write_str(&num)
        } else {
            write!(f, "{}/{}", num, format_product(den_terms))
        }
    }
}

impl From<Dimension> for String {
    fn from(dim: Dimension) -> Self {
        dim.to_string()
    }
}

impl TryFrom<String> for Dimension {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Dimension::parse_descriptor(&value)
    }
}

/// A unit resolved against the atom table: `si_value = value * factor + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUnit {
    pub dimension: Dimension,
    pub factor: f64,
    /// Non-zero only for a bare affine temperature scale (`°C`, `°F`).
    pub offset: f64,
}

impl ParsedUnit {
    pub fn dimensionless() -> Self {
        Self { dimension: Dimension::dimensionless(), factor: 1.0, offset: 0.0 }
    }

    /// Parses an engineering unit string such as `W/m·K`, `kg/m³`, `Pa·s` or `°C`.
    ///
    /// Only one `/` is allowed; everything after it is the denominator, so
    /// `W/m·K` reads as W/(m·K).
    pub fn parse(s: &str) -> Result<Self, UnitError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UnitError::Empty);
        }
        if is_dimensionless_marker(trimmed) {
            return Ok(Self::dimensionless());
        }
        if trimmed == "%" {
            return Ok(Self { factor: 0.01, ..Self::dimensionless() });
        }

        let cleaned: String = trimmed
            .chars()
            .filter(|c| *c != '(' && *c != ')' && *c != '[' && *c != ']')
            .map(|c| if c == '−' { '-' } else { c })
            .collect();

        let mut parts = cleaned.split('/');
        let mut unit = Self::dimensionless();
        let mut atom_count = 0;
        let mut single_offset = 0.0;

        if let Some(num) = parts.next() {
            for (atom, exp) in parse_product(num)? {
                unit.apply(atom, exp)?;
                atom_count += 1;
                if exp == 1 {
                    single_offset = atom.offset;
                }
            }
        }
        if let Some(den) = parts.next() {
            for (atom, exp) in parse_product(den)? {
                unit.apply(atom, -exp)?;
                atom_count += 2; // any denominator rules out an affine scale
            }
        }
        if parts.next().is_some() {
            return Err(UnitError::MultipleDivisions(trimmed.to_string()));
        }

        // Offsets only apply to absolute temperatures, never to compound units
        // such as W/m·°C, where the temperature is a difference.
        if atom_count == 1 {
            unit.offset = single_offset;
        }
        Ok(unit)
    }

    fn apply(&mut self, atom: &UnitAtom, exp: i32) -> Result<(), UnitError> {
        self.dimension.multiply_by(&atom.dimension().powi(exp)?)?;
        self.factor *= atom.factor.powi(exp);
        Ok(())
    }

    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.dimension == other.dimension
    }
}

/// Linear conversion `to = from * factor + offset` between two compatible units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub factor: f64,
    pub offset: f64,
}

impl Conversion {
    pub fn identity() -> Self {
        Self { factor: 1.0, offset: 0.0 }
    }

    pub fn is_identity(&self) -> bool {
        (self.factor - 1.0).abs() < 1e-12 && self.offset.abs() < 1e-12
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.factor + self.offset
    }
}

/// Derives the conversion from `from` to `to`, or `None` if the dimensions differ.
pub fn conversion_between(from: &ParsedUnit, to: &ParsedUnit) -> Option<Conversion> {
    if !from.is_compatible_with(to) || to.factor == 0.0 {
        return None;
    }
    let factor = from.factor / to.factor;
    let offset = (from.offset - to.offset) / to.factor;
    if !factor.is_finite() || !offset.is_finite() {
        return None;
    }
    Some(Conversion { factor, offset })
}

/// Normalizes a raw unit string from a table header.
///
/// Configured literal rewrites run first, then whitespace around `/` is dropped
/// and any remaining internal whitespace collapses to a middot.
pub fn normalize(raw: &str, rewrites: &[UnitRewrite]) -> String {
    let mut units = raw.trim().to_string();
    for rewrite in rewrites {
        if !rewrite.from.is_empty() {
            units = units.replace(&rewrite.from, &rewrite.to);
        }
    }

    let mut out = String::with_capacity(units.len());
    let mut pending_space = false;
    for c in units.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() && c != '/' && !out.ends_with('/') && !out.ends_with('·') && c != '·' {
            out.push('·');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

fn is_dimensionless_marker(s: &str) -> bool {
    matches!(s, "-" | "—" | "–" | "1" | "rad" | "sr")
        || s.eq_ignore_ascii_case("dimensionless")
        || s.eq_ignore_ascii_case("none")
}

/// One entry of the unit atom table. Exponents are L, M, T, Θ, I, N, J.
#[derive(Debug)]
struct UnitAtom {
    symbol: &'static str,
    exps: [i8; 7],
    factor: f64,
    offset: f64,
}

impl UnitAtom {
    fn dimension(&self) -> Dimension {
        const BASES: [BaseDimension; 7] = [
            BaseDimension::Length,
            BaseDimension::Mass,
            BaseDimension::Time,
            BaseDimension::Temperature,
            BaseDimension::Current,
            BaseDimension::Amount,
            BaseDimension::Luminosity,
        ];
        let terms = BASES
            .iter()
            .zip(self.exps.iter())
            .filter(|&(_, &e)| e != 0)
            .map(|(b, &e)| (*b, e as i32))
            .collect();
        Dimension { terms }
    }
}

const fn atom(symbol: &'static str, exps: [i8; 7], factor: f64) -> UnitAtom {
    UnitAtom { symbol, exps, factor, offset: 0.0 }
}

const LEN: [i8; 7] = [1, 0, 0, 0, 0, 0, 0];
const MASS: [i8; 7] = [0, 1, 0, 0, 0, 0, 0];
const TIME: [i8; 7] = [0, 0, 1, 0, 0, 0, 0];
const TEMP: [i8; 7] = [0, 0, 0, 1, 0, 0, 0];
const CURRENT: [i8; 7] = [0, 0, 0, 0, 1, 0, 0];
const AMOUNT: [i8; 7] = [0, 0, 0, 0, 0, 1, 0];
const LUMINOUS: [i8; 7] = [0, 0, 0, 0, 0, 0, 1];
const FORCE: [i8; 7] = [1, 1, -2, 0, 0, 0, 0];
const PRESSURE: [i8; 7] = [-1, 1, -2, 0, 0, 0, 0];
const ENERGY: [i8; 7] = [2, 1, -2, 0, 0, 0, 0];
const POWER: [i8; 7] = [2, 1, -3, 0, 0, 0, 0];
const VOLUME: [i8; 7] = [3, 0, 0, 0, 0, 0, 0];
const FREQUENCY: [i8; 7] = [0, 0, -1, 0, 0, 0, 0];
const VOLTAGE: [i8; 7] = [2, 1, -3, 0, -1, 0, 0];
const NONE: [i8; 7] = [0; 7];

static UNIT_ATOMS: &[UnitAtom] = &[
    atom("m", LEN, 1.0),
    atom("cm", LEN, 1e-2),
    atom("mm", LEN, 1e-3),
    atom("km", LEN, 1e3),
    atom("μm", LEN, 1e-6),
    atom("µm", LEN, 1e-6),
    atom("um", LEN, 1e-6),
    atom("nm", LEN, 1e-9),
    atom("in", LEN, 0.0254),
    atom("ft", LEN, 0.3048),
    atom("kg", MASS, 1.0),
    atom("g", MASS, 1e-3),
    atom("mg", MASS, 1e-6),
    atom("lb", MASS, 0.453_592_37),
    atom("lbm", MASS, 0.453_592_37),
    atom("s", TIME, 1.0),
    atom("ms", TIME, 1e-3),
    atom("min", TIME, 60.0),
    atom("h", TIME, 3600.0),
    atom("hr", TIME, 3600.0),
    atom("K", TEMP, 1.0),
    UnitAtom { symbol: "°C", exps: TEMP, factor: 1.0, offset: 273.15 },
    UnitAtom { symbol: "℃", exps: TEMP, factor: 1.0, offset: 273.15 },
    UnitAtom { symbol: "°F", exps: TEMP, factor: 5.0 / 9.0, offset: 255.372_222_222_222_2 },
    atom("°R", TEMP, 5.0 / 9.0),
    atom("A", CURRENT, 1.0),
    atom("mol", AMOUNT, 1.0),
    atom("kmol", AMOUNT, 1e3),
    atom("cd", LUMINOUS, 1.0),
    atom("N", FORCE, 1.0),
    atom("kN", FORCE, 1e3),
    atom("lbf", FORCE, 4.448_221_615_260_5),
    atom("Pa", PRESSURE, 1.0),
    atom("kPa", PRESSURE, 1e3),
    atom("MPa", PRESSURE, 1e6),
    atom("GPa", PRESSURE, 1e9),
    atom("bar", PRESSURE, 1e5),
    atom("atm", PRESSURE, 101_325.0),
    atom("psi", PRESSURE, 6_894.757_293_168),
    atom("J", ENERGY, 1.0),
    atom("kJ", ENERGY, 1e3),
    atom("MJ", ENERGY, 1e6),
    atom("cal", ENERGY, 4.184),
    atom("kcal", ENERGY, 4_184.0),
    atom("Btu", ENERGY, 1_055.055_852_62),
    atom("BTU", ENERGY, 1_055.055_852_62),
    atom("kWh", ENERGY, 3.6e6),
    atom("W", POWER, 1.0),
    atom("mW", POWER, 1e-3),
    atom("kW", POWER, 1e3),
    atom("MW", POWER, 1e6),
    atom("L", VOLUME, 1e-3),
    atom("mL", VOLUME, 1e-6),
    atom("Hz", FREQUENCY, 1.0),
    atom("V", VOLTAGE, 1.0),
    atom("rad", NONE, 1.0),
    atom("°", NONE, std::f64::consts::PI / 180.0),
];

fn lookup_atom(symbol: &str) -> Option<&'static UnitAtom> {
    UNIT_ATOMS.iter().find(|a| a.symbol == symbol)
}

/// Splits a product such as `kg·m²` into atoms with their exponents.
fn parse_product(product: &str) -> Result<Vec<(&'static UnitAtom, i32)>, UnitError> {
    let mut factors = Vec::new();
    for factor in product.split(|c: char| matches!(c, '·' | '*' | '⋅' | '.' | ' ')) {
        let factor = factor.trim();
        if factor.is_empty() || factor == "1" {
            continue;
        }
        let (base, exp) = split_exponent(factor)?;
        let atom = lookup_atom(base).ok_or_else(|| UnitError::UnknownUnit(base.to_string()))?;
        factors.push((atom, exp));
    }
    Ok(factors)
}

/// Separates `m^2`, `m²`, `s⁻¹`, `m2` or `s-1` into base and exponent.
fn split_exponent(factor: &str) -> Result<(&str, i32), UnitError> {
    if let Some((base, exp)) = factor.split_once('^') {
        let exp = exp.trim_matches(|c| c == '{' || c == '}');
        return Ok((base, bounded_exponent(exp, factor)?));
    }

    let split_at = factor
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() || *c == '-' || superscript_digit(*c).is_some() || *c == '⁻')
        .map(|(i, _)| i);

    match split_at {
        None => Ok((factor, 1)),
        Some(0) => Err(UnitError::InvalidExponent(factor.to_string())),
        Some(i) => {
            let (base, exp_str) = factor.split_at(i);
            let ascii: String = exp_str
                .chars()
                .map(|c| match c {
                    '⁻' => Some('-'),
                    c if c.is_ascii_digit() || c == '-' => Some(c),
                    c => superscript_digit(c),
                })
                .collect::<Option<String>>()
                .ok_or_else(|| UnitError::InvalidExponent(factor.to_string()))?;
            Ok((base, bounded_exponent(&ascii, factor)?))
        }
    }
}

fn in_exponent_range(exp: &i32) -> bool {
    (-MAX_EXPONENT..=MAX_EXPONENT).contains(exp)
}

fn bounded_exponent(exp: &str, factor: &str) -> Result<i32, UnitError> {
    exp.parse::<i32>()
        .ok()
        .filter(in_exponent_range)
        .ok_or_else(|| UnitError::InvalidExponent(factor.to_string()))
}

fn superscript_digit(c: char) -> Option<char> {
    match c {
        '⁰' => Some('0'),
        '¹' => Some('1'),
        '²' => Some('2'),
        '³' => Some('3'),
        '⁴' => Some('4'),
        '⁵' => Some('5'),
        '⁶' => Some('6'),
        '⁷' => Some('7'),
        '⁸' => Some('8'),
        '⁹' => Some('9'),
        _ => None,
    }
}

// --- Unit Parser Test Suite ---
#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("W/m·K", "L*M/T^3*Θ")]
    #[case("W/(m·K)", "L*M/T^3*Θ")]
    #[case("W/m²·K", "M/T^3*Θ")]
    #[case("kg/m³", "M/L^3")]
    #[case("kg/m^3", "M/L^3")]
    #[case("J/kg·K", "L^2/T^2*Θ")]
    #[case("m²/s", "L^2/T")]
    #[case("m2/s", "L^2/T")]
    #[case("Pa·s", "M/L*T")]
    #[case("N·s/m²", "M/L*T")]
    #[case("s-1", "1/T")]
    #[case("°C", "Θ")]
    #[case("-", "dimensionless")]
    #[case("%", "dimensionless")]
    fn test_unit_parsing_and_canonicalization(#[case] input: &str, #[case] expected: &str) {
        let parsed = ParsedUnit::parse(input).unwrap();
        assert_eq!(parsed.dimension.to_string(), expected, "Input: {}", input);
    }

    #[test]
    fn test_parse_invalid() {
        let failures = vec![
            "",          // Empty
            "   ",       // Whitespace
            "W/m/K",     // Double slash
            "m^bar",     // Non-numeric exponent
            "furlong",   // Unknown atom
            "W^1500000000",
            "m^-2147483648",
            "s⁹⁹",
        ];
        for input in failures {
            assert!(ParsedUnit::parse(input).is_err(), "Should fail: '{}'", input);
        }
    }

    #[rstest]
    #[case("W^1500000000")]
    #[case("m^{40}")]
    #[case("kg33")]
    #[case("m^32·m^32")]
    fn test_oversized_exponents_are_errors(#[case] input: &str) {
        assert!(matches!(
            ParsedUnit::parse(input),
            Err(UnitError::InvalidExponent(_) | UnitError::ExponentOverflow(_))
        ));
    }

    #[test]
    fn test_dimension_arithmetic_is_checked() {
        let length = Dimension::base(BaseDimension::Length);
        assert_eq!(length.powi(i32::MAX), Err(UnitError::ExponentOverflow(BaseDimension::Length)));
        assert_eq!(length.powi(-3).unwrap().exponent(BaseDimension::Length), -3);

        let mut volume = length.powi(MAX_EXPONENT).unwrap();
        assert!(volume.multiply_by(&length).is_err());
        assert_eq!(volume.exponent(BaseDimension::Length), MAX_EXPONENT);
        volume.divide_by(&length).unwrap();
        assert_eq!(volume.exponent(BaseDimension::Length), MAX_EXPONENT - 1);
        assert!(Dimension::parse_descriptor("L^2147483647*L").is_err());
    }

    #[test]
    fn test_celsius_to_kelvin_conversion() {
        let c = ParsedUnit::parse("°C").unwrap();
        let k = ParsedUnit::parse("K").unwrap();
        let conv = conversion_between(&c, &k).unwrap();
        assert!((conv.factor - 1.0).abs() < 1e-12);
        assert!((conv.apply(25.0) - 298.15).abs() < 1e-9);

        let back = conversion_between(&k, &c).unwrap();
        assert!((back.apply(373.15) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_compound_temperature_has_no_offset() {
        let per_c = ParsedUnit::parse("W/m·°C").unwrap();
        let per_k = ParsedUnit::parse("W/m·K").unwrap();
        let conv = conversion_between(&per_c, &per_k).unwrap();
        assert!(conv.is_identity());
    }

    #[test]
    fn test_prefixed_conversion() {
        let kpa = ParsedUnit::parse("kPa").unwrap();
        let pa = ParsedUnit::parse("Pa").unwrap();
        assert!((conversion_between(&kpa, &pa).unwrap().factor - 1000.0).abs() < 1e-9);
        let m = ParsedUnit::parse("m").unwrap();
        assert!(conversion_between(&kpa, &m).is_none());
    }

    #[test]
    fn test_dimension_descriptor_round_trip() {
        let dim = Dimension::parse_descriptor("L*M/T^3*Θ").unwrap();
        assert_eq!(dim, ParsedUnit::parse("W/m·K").unwrap().dimension);
        assert!(Dimension::parse_descriptor("dimensionless").unwrap().is_dimensionless());
        assert!(Dimension::parse_descriptor("L/X").is_err());
    }

    #[rstest]
    #[case("W/m K", "W/m·K")]
    #[case("W / m K", "W/m·K")]
    #[case("kg/m3", "kg/m³")]
    #[case("m2/s", "m²/s")]
    #[case("deg C", "°C")]
    #[case("  J/kg  K ", "J/kg·K")]
    fn test_normalize(#[case] raw: &str, #[case] expected: &str) {
        let rewrites = crate::config::DetectorConfig::default().unit_rewrites;
        assert_eq!(normalize(raw, &rewrites), expected);
    }
}
