//! String similarity between an equation symbol and a column name.

use crate::analysis::latex::greek_name;

/// Symbols whose spelled-out meaning is stable across engineering texts.
static ABBREVIATIONS: &[(&str, &str)] = &[
    ("T", "temperature"),
    ("t", "time"),
    ("k", "conductivity"),
    ("h", "heat transfer coefficient"),
    ("q", "heat"),
    ("Q", "heat"),
    ("p", "pressure"),
    ("P", "pressure"),
    ("V", "velocity"),
    ("c_p", "specific heat"),
    ("cp", "specific heat"),
    ("m", "mass"),
    ("L", "length"),
    ("D", "diameter"),
    ("r", "radius"),
    ("A", "area"),
    ("E", "modulus"),
    ("g", "gravity"),
    ("Re", "reynolds"),
    ("Nu", "nusselt"),
    ("Pr", "prandtl"),
];

/// Spells out a symbol for name comparison: `ε` -> "epsilon", `c_p` -> "specific heat".
pub fn expand_symbol(symbol: &str, base: &str) -> String {
    if let Some((_, name)) = ABBREVIATIONS.iter().find(|(s, _)| *s == symbol || *s == base) {
        return name.to_string();
    }
    let mut chars = base.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(name) = greek_name(c) {
            return name.to_string();
        }
    }
    symbol.to_lowercase()
}

/// Ratcliff/Obershelp similarity `2·M / (|a| + |b|)`, case-insensitive.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Characters in the longest common block plus, recursively, the blocks to
/// its left and right.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let Some((i, j, len)) = longest_common_block(a, b) else {
        return 0;
    };
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Earliest longest common substring as `(start_a, start_b, len)`.
fn longest_common_block(a: &[char], b: &[char]) -> Option<(usize, usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        for j in 0..b.len() {
            curr[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            let len = curr[j + 1];
            if len > best.map_or(0, |(_, _, l)| l) {
                best = Some((i + 1 - len, j + 1 - len, len));
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abcd", "bcde", 0.75)]
    #[case("temperature", "Temperature", 1.0)]
    #[case("abc", "xyz", 0.0)]
    #[case("", "", 1.0)]
    fn test_ratio(#[case] a: &str, #[case] b: &str, #[case] expected: f64) {
        assert!((ratio(a, b) - expected).abs() < 1e-12, "ratio({a}, {b}) = {}", ratio(a, b));
    }

    #[test]
    fn test_ratio_recurses_into_both_sides() {
        // blocks "b", "cd" -> M = 3
        assert!((ratio("abxcd", "bycd") - 6.0 / 9.0).abs() < 1e-12);
    }

    #[rstest]
    #[case("ε", "ε", "epsilon")]
    #[case("c_p", "c", "specific heat")]
    #[case("T_s", "T", "temperature")]
    #[case("ρ", "ρ", "rho")]
    #[case("x", "x", "x")]
    fn test_expand_symbol(#[case] symbol: &str, #[case] base: &str, #[case] expected: &str) {
        assert_eq!(expand_symbol(symbol, base), expected);
    }
}
