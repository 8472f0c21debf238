//! Rewrites LaTeX equation markup into the plain symbolic form the variable
//! scanner reads: `\frac{dT}{dx}` -> `(dT)/(dx)`, `\alpha` -> `α`,
//! `\partial` -> `∂`. Sub/superscript groups (`_{p}`) are left intact.

use crate::analysis::error::ExtractionError;

/// Greek letter names and their glyphs, lowercase first.
pub(crate) static GREEK_LETTERS: &[(&str, char)] = &[
    ("alpha", 'α'), ("beta", 'β'), ("gamma", 'γ'), ("delta", 'δ'), ("epsilon", 'ε'),
    ("varepsilon", 'ε'), ("zeta", 'ζ'), ("eta", 'η'), ("theta", 'θ'), ("vartheta", 'θ'),
    ("iota", 'ι'), ("kappa", 'κ'), ("lambda", 'λ'), ("mu", 'μ'), ("nu", 'ν'), ("xi", 'ξ'),
    ("pi", 'π'), ("rho", 'ρ'), ("sigma", 'σ'), ("tau", 'τ'), ("upsilon", 'υ'), ("phi", 'φ'),
    ("varphi", 'φ'), ("chi", 'χ'), ("psi", 'ψ'), ("omega", 'ω'),
    ("Gamma", 'Γ'), ("Delta", 'Δ'), ("Theta", 'Θ'), ("Lambda", 'Λ'), ("Xi", 'Ξ'), ("Pi", 'Π'),
    ("Sigma", 'Σ'), ("Upsilon", 'Υ'), ("Phi", 'Φ'), ("Psi", 'Ψ'), ("Omega", 'Ω'),
];

pub(crate) fn greek_glyph(name: &str) -> Option<char> {
    GREEK_LETTERS.iter().find(|(n, _)| *n == name).map(|(_, g)| *g)
}

/// Spelled-out name of a Greek glyph (`ε` -> "epsilon").
pub(crate) fn greek_name(glyph: char) -> Option<&'static str> {
    let glyph = match glyph {
        'ϵ' => 'ε',
        'ϑ' => 'θ',
        'ϕ' => 'φ',
        g => g,
    };
    GREEK_LETTERS.iter().find(|(_, g)| *g == glyph).map(|(n, _)| *n)
}

pub(crate) fn is_greek(c: char) -> bool {
    matches!(c, 'Α'..='Ω' | 'α'..='ω' | 'ϵ' | 'ϑ' | 'ϕ')
}

/// Normalizes LaTeX markup into plain symbolic text.
pub fn normalize_markup(equation_id: &str, markup: &str) -> Result<String, ExtractionError> {
    let mut parser = MarkupParser { chars: markup.chars().collect(), pos: 0, equation_id };
    parser.parse_until(None)
}

struct MarkupParser<'a> {
    chars: Vec<char>,
    pos: usize,
    equation_id: &'a str,
}

impl MarkupParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn unbalanced(&self) -> ExtractionError {
        ExtractionError::UnbalancedDelimiter { equation_id: self.equation_id.to_string(), delimiter: '{' }
    }

    fn malformed(&self, message: impl Into<String>) -> ExtractionError {
        ExtractionError::MalformedMarkup { equation_id: self.equation_id.to_string(), message: message.into() }
    }

    fn parse_until(&mut self, end: Option<char>) -> Result<String, ExtractionError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            if Some(c) == end {
                return Ok(out);
            }
            match c {
                '\\' => out.push_str(&self.command()?),
                '{' => {
                    let inner = self.parse_until(Some('}'))?;
                    out.push('{');
                    out.push_str(&inner);
                    out.push('}');
                }
                '}' => return Err(self.unbalanced()),
                '~' | '&' => out.push(' '),
                _ => out.push(c),
            }
        }
        match end {
            Some(_) => Err(self.unbalanced()),
            None => Ok(out),
        }
    }

    /// A command argument: a brace group, a nested command, or one character.
    fn group(&mut self) -> Result<String, ExtractionError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        match self.peek() {
            Some('{') => {
                self.pos += 1;
                self.parse_until(Some('}'))
            }
            Some('\\') => {
                self.pos += 1;
                self.command()
            }
            Some(c) => {
                self.pos += 1;
                Ok(c.to_string())
            }
            None => Err(self.malformed("command is missing an argument")),
        }
    }

    fn command(&mut self) -> Result<String, ExtractionError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        if name.is_empty() {
            let Some(c) = self.peek() else {
                return Err(self.malformed("trailing backslash"));
            };
            self.pos += 1;
            return Ok(match c {
                ',' | ';' | ':' | '!' | ' ' | '\\' => " ".to_string(),
                '{' => "(".to_string(),
                '}' => ")".to_string(),
                other => other.to_string(),
            });
        }

        let rendered = match name.as_str() {
            "frac" | "dfrac" | "tfrac" => {
                let num = self.group()?;
                let den = self.group()?;
                format!("({num})/({den})")
            }
            "partial" => "∂".to_string(),
            "cdot" | "times" => "·".to_string(),
            "infty" => "∞".to_string(),
            "left" | "right" | "big" | "Big" | "bigg" | "Bigg" => {
                // `\left.` is an invisible delimiter
                if self.peek() == Some('.') {
                    self.pos += 1;
                }
                String::new()
            }
            "mathrm" | "text" | "textrm" | "mathit" | "mathbf" | "mathsf" | "operatorname" | "dot"
            | "ddot" | "bar" | "hat" | "tilde" | "vec" | "overline" => self.group()?,
            "sqrt" => {
                if self.peek() == Some('[') {
                    while let Some(c) = self.peek() {
                        self.pos += 1;
                        if c == ']' {
                            break;
                        }
                    }
                }
                format!("sqrt({})", self.group()?)
            }
            "quad" | "qquad" => " ".to_string(),
            "approx" => "≈".to_string(),
            "leq" | "le" => "≤".to_string(),
            "geq" | "ge" => "≥".to_string(),
            "neq" => "≠".to_string(),
            "pm" => "±".to_string(),
            "nabla" => "∇".to_string(),
            other => match greek_glyph(other) {
                Some(glyph) => glyph.to_string(),
                // Function names and operators (\exp, \ln, \sum) stay words.
                None => format!(" {other} "),
            },
        };
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r"q = -k \frac{dT}{dx}", "q = -k (dT)/(dx)")]
    #[case(r"\rho c_{p} \frac{\partial T}{\partial t}", "ρ c_{p} (∂T)/(∂t)")]
    #[case(r"E = \varepsilon \sigma T^{4}", "E = ε σ T^{4}")]
    #[case(r"\mathrm{Nu} = 0.023 \mathrm{Re}^{0.8}", "Nu = 0.023 Re^{0.8}")]
    #[case(r"\left( T_s - T_\infty \right)", "( T_s - T_∞ )")]
    #[case(r"y = \sqrt{x}", "y = sqrt(x)")]
    fn test_normalize_markup(#[case] markup: &str, #[case] expected: &str) {
        assert_eq!(normalize_markup("eq:1", markup).unwrap(), expected);
    }

    #[test]
    fn test_function_names_become_words() {
        let out = normalize_markup("eq:1", r"\exp(-x)").unwrap();
        assert_eq!(out.trim_start(), "exp (-x)");
    }

    #[rstest]
    #[case(r"\frac{a}{b")]
    #[case(r"x}")]
    #[case(r"\frac")]
    #[case(r"x \")]
    fn test_malformed_markup(#[case] markup: &str) {
        assert!(normalize_markup("eq:1", markup).is_err(), "Should fail: '{}'", markup);
    }

    #[test]
    fn test_greek_round_trip() {
        assert_eq!(greek_name('ε'), Some("epsilon"));
        assert_eq!(greek_glyph("rho"), Some('ρ'));
        assert!(is_greek('Ω'));
        assert!(!is_greek('∂'));
    }
}
