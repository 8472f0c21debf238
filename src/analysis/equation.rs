//! Equation variable extraction.
//!
//! Scans an equation's symbolic text for one-letter (Latin or Greek) tokens
//! with their sub/superscript groups, classifies each token's role and
//! resolves it against the concept registry.

use crate::analysis::error::ExtractionError;
use crate::analysis::latex::{greek_glyph, is_greek, normalize_markup};
use crate::store::records::Equation;
use crate::store::registry::{ConceptRegistry, ResolutionContext};
use crate::store::types::{EquationVariable, VariableRole};
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `dT/dx`, `d^2T/dx^2`, `(∂T)/(∂t)`, `d/dx`.
static DIFFERENTIAL_FRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^A-Za-z])[d∂](?:\^?\{?[0-9²³]\}?)?\s*(?:[A-Za-zα-ωΑ-Ω](?:_\{?[A-Za-z0-9]+\}?)?)?\s*\)?\s*/\s*\(?\s*[d∂]\s*[A-Za-zα-ωΑ-Ω]",
    )
    .expect("differential fraction pattern is a valid literal")
});

/// Extracts the variables of one equation.
pub struct VariableExtractor<'r> {
    registry: &'r ConceptRegistry,
}

impl<'r> VariableExtractor<'r> {
    pub fn new(registry: &'r ConceptRegistry) -> Self {
        Self { registry }
    }

    /// Extracts variables, logging and swallowing malformed input.
    pub fn extract(&self, equation: &Equation) -> Vec<EquationVariable> {
        match self.try_extract(equation) {
            Ok(variables) => variables,
            Err(e) => {
                tracing::warn!(equation_id = %equation.equation_id, error = %e, "Skipping unreadable equation");
                Vec::new()
            }
        }
    }

    pub fn try_extract(&self, equation: &Equation) -> Result<Vec<EquationVariable>, ExtractionError> {
        let text = symbolic_text(equation)?;
        check_balanced(&equation.equation_id, &text)?;

        let chars: Vec<char> = text.chars().collect();
        let differential = DIFFERENTIAL_FRACTION.is_match(&text);
        let tokens = Scanner::new(&chars, differential).run();

        let equals = assignment_positions(&chars);
        let first_equals = chars.iter().position(|&c| c == '=');
        let output_symbol = match equals.as_deref() {
            Some([single]) => single_lhs_symbol(&chars, *single, &tokens),
            _ => None,
        };

        let context_text = match &equation.section {
            Some(section) => format!("{} {}", equation.text, section),
            None => equation.text.clone(),
        };

        let mut variables: Vec<EquationVariable> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for token in tokens {
            let left_of_equals = first_equals.is_some_and(|eq| token.end <= eq);
            if let Some(&idx) = seen.get(&token.symbol) {
                let existing = &mut variables[idx];
                existing.has_derivative |= token.has_derivative;
                existing.in_function_argument |= token.in_function_argument;
                existing.appears_left_of_equals |= left_of_equals;
                continue;
            }
            seen.insert(token.symbol.clone(), variables.len());
            variables.push(self.to_variable(equation, &context_text, token, left_of_equals));
        }

        for variable in &mut variables {
            variable.role = classify(variable, output_symbol.as_deref());
        }
        tracing::trace!(equation_id = %equation.equation_id, count = variables.len(), "Extracted variables");
        Ok(variables)
    }

    fn to_variable(&self, equation: &Equation, context_text: &str, token: Token, left_of_equals: bool) -> EquationVariable {
        let hint = equation.variable_units.get(&token.symbol);
        let ctx = ResolutionContext {
            source_id: &equation.equation_id,
            text: context_text,
            units: hint.map(String::as_str),
        };
        let concept = self
            .registry
            .resolve(&token.symbol, &ctx)
            .or_else(|| self.registry.resolve(&token.base, &ctx));
        let units = hint
            .cloned()
            .or_else(|| concept.and_then(|c| c.preferred_unit()).map(str::to_string));

        EquationVariable {
            equation_id: equation.equation_id.clone(),
            symbol: token.symbol,
            base: token.base,
            role: VariableRole::Parameter,
            canonical_id: concept.map(|c| c.canonical_id.clone()),
            appears_left_of_equals: left_of_equals,
            has_derivative: token.has_derivative,
            in_function_argument: token.in_function_argument,
            is_greek: token.is_greek,
            subscripts: token.subscripts,
            superscripts: token.superscripts,
            units,
        }
    }
}

/// Role rules, first match wins.
fn classify(variable: &EquationVariable, output_symbol: Option<&str>) -> VariableRole {
    if output_symbol == Some(variable.symbol.as_str()) {
        VariableRole::Output
    } else if variable.has_derivative || variable.in_function_argument {
        VariableRole::Input
    } else {
        // Greek letters and everything else are parameters.
        VariableRole::Parameter
    }
}

fn symbolic_text(equation: &Equation) -> Result<String, ExtractionError> {
    if let Some(markup) = equation.symbolic_markup.as_deref().filter(|m| !m.trim().is_empty()) {
        match normalize_markup(&equation.equation_id, markup) {
            Ok(text) => return Ok(text),
            Err(e) if !equation.text.trim().is_empty() => {
                tracing::debug!(equation_id = %equation.equation_id, error = %e, "Markup unusable, scanning plain text");
            }
            Err(e) => return Err(e),
        }
    }
    if equation.text.trim().is_empty() {
        return Err(ExtractionError::EmptyEquation(equation.equation_id.clone()));
    }
    Ok(equation.text.clone())
}

fn check_balanced(equation_id: &str, text: &str) -> Result<(), ExtractionError> {
    let mut stack: Vec<char> = Vec::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(open) {
                    return Err(ExtractionError::UnbalancedDelimiter { equation_id: equation_id.to_string(), delimiter: open });
                }
            }
            _ => {}
        }
    }
    match stack.pop() {
        Some(open) => Err(ExtractionError::UnbalancedDelimiter { equation_id: equation_id.to_string(), delimiter: open }),
        None => Ok(()),
    }
}

/// Char offsets of assignment `=` signs, or `None` when the text contains a
/// comparison (`<=`, `>=`, `!=`, `==`) and so is not an assignment.
fn assignment_positions(chars: &[char]) -> Option<Vec<usize>> {
    let mut positions = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        if c != '=' {
            continue;
        }
        let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
        if matches!(prev, Some('<' | '>' | '!' | '=')) || chars.get(i + 1) == Some(&'=') {
            return None;
        }
        positions.push(i);
    }
    Some(positions)
}

/// The symbol of the left-hand side when it is nothing but one variable token.
fn single_lhs_symbol(chars: &[char], equals: usize, tokens: &[Token]) -> Option<String> {
    let mut lhs_tokens = tokens.iter().filter(|t| t.end <= equals);
    let token = lhs_tokens.next()?;
    if lhs_tokens.next().is_some() {
        return None;
    }
    let significant = |c: &&char| !c.is_whitespace() && !matches!(c, '(' | ')' | '{' | '}');
    let lhs: String = chars[..equals].iter().filter(significant).collect();
    let raw: String = chars[token.start..token.end].iter().filter(significant).collect();
    (lhs == raw).then(|| token.symbol.clone())
}

#[derive(Debug, Clone)]
struct Token {
    symbol: String,
    base: String,
    subscripts: SmallVec<[String; 2]>,
    superscripts: SmallVec<[String; 2]>,
    is_greek: bool,
    has_derivative: bool,
    in_function_argument: bool,
    // char offsets into the scanned text
    start: usize,
    end: usize,
}

struct Scanner<'a> {
    chars: &'a [char],
    pos: usize,
    differential: bool,
    paren_depth: usize,
    function_depths: Vec<usize>,
    pending_function: bool,
    /// Number of upcoming tokens that sit inside a derivative.
    derivative_budget: u8,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(chars: &'a [char], differential: bool) -> Self {
        Self {
            chars,
            pos: 0,
            differential,
            paren_depth: 0,
            function_depths: Vec::new(),
            pending_function: false,
            derivative_budget: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.peek() {
            match c {
                '(' | '[' => {
                    self.pos += 1;
                    self.paren_depth += 1;
                    if self.pending_function {
                        self.function_depths.push(self.paren_depth);
                        self.pending_function = false;
                    }
                }
                ')' | ']' => {
                    self.pos += 1;
                    if self.function_depths.last() == Some(&self.paren_depth) {
                        self.function_depths.pop();
                    }
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                }
                '∂' => {
                    self.pos += 1;
                    if self.differential {
                        self.differential_operator();
                    }
                }
                'π' => self.pos += 1,
                // ΔT: a difference, not a variable named Δ
                'Δ' if self.peek_at(self.pos + 1).is_some_and(|n| n.is_ascii_alphabetic() || is_greek(n)) => {
                    self.pos += 1
                }
                c if is_greek(c) => {
                    let start = self.pos;
                    self.pos += 1;
                    self.emit(start, c.to_string(), true, false);
                }
                c if c.is_ascii_alphabetic() => self.word(),
                _ => self.pos += 1,
            }
        }
        self.tokens
    }

    /// After a `d` or `∂` prefix: an operator (`d/dx`, `(∂)/(∂x)`) covers the
    /// denominator variable and its operand; a prefix covers the next token.
    fn differential_operator(&mut self) {
        self.skip_numeric_exponent();
        let mut look = self.pos;
        while self.peek_at(look).is_some_and(char::is_whitespace) {
            look += 1;
        }
        let budget = if matches!(self.peek_at(look), Some('/' | ')')) { 2 } else { 1 };
        self.derivative_budget = self.derivative_budget.max(budget);
    }

    fn word(&mut self) {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        let next = self.peek();

        if word.len() == 1 {
            let letter = self.chars[start];
            if letter == 'd' && self.differential && next != Some('_') && self.is_differential_prefix() {
                self.differential_operator();
                return;
            }
            if matches!(letter, 'e' | 'E') && self.is_numeric_exponent_marker(start) {
                return;
            }
            self.emit(start, word, false, false);
            return;
        }

        if next == Some('(') {
            self.pending_function = true;
            return;
        }
        if let Some(glyph) = greek_glyph(&word) {
            if glyph != 'π' {
                self.emit(start, glyph.to_string(), true, false);
            }
            return;
        }
        let mut letters = word.chars();
        if self.differential && word.len() == 2 && letters.next() == Some('d') {
            // `dT` inside a differential fraction
            let base = letters.as_str().to_string();
            self.derivative_budget = self.derivative_budget.saturating_sub(1);
            self.emit(start + 1, base, false, true);
        }
        // any other multi-letter word is a name or abbreviation, not a variable
    }

    /// A bare `d` followed by `/`, `)` or (after an optional numeric exponent) a letter.
    fn is_differential_prefix(&self) -> bool {
        let mut look = self.pos;
        if self.peek_at(look) == Some('^') {
            look += 1;
            if self.peek_at(look) == Some('{') {
                look += 1;
            }
        }
        while self.peek_at(look).is_some_and(|c| c.is_ascii_digit() || matches!(c, '²' | '³' | '}')) {
            look += 1;
        }
        while self.peek_at(look).is_some_and(char::is_whitespace) {
            look += 1;
        }
        match self.peek_at(look) {
            Some('/' | ')') => true,
            Some(c) => look > self.pos && (c.is_ascii_alphabetic() || is_greek(c)),
            None => false,
        }
    }

    /// `e` in `2.5e3` or `1e-6`.
    fn is_numeric_exponent_marker(&self, at: usize) -> bool {
        let prev_digit = at.checked_sub(1).and_then(|p| self.peek_at(p)).is_some_and(|c| c.is_ascii_digit() || c == '.');
        let next = self.peek_at(at + 1);
        let next_numeric = match next {
            Some('-' | '+') => self.peek_at(at + 2).is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        };
        prev_digit && next_numeric
    }

    fn skip_numeric_exponent(&mut self) {
        if self.peek() == Some('^') {
            let save = self.pos;
            self.pos += 1;
            match self.script_group() {
                Some(group) if is_numeric(&group) => {}
                _ => self.pos = save,
            }
        }
        while self.peek().is_some_and(is_superscript_digit) {
            self.pos += 1;
        }
    }

    fn emit(&mut self, start: usize, base: String, is_greek: bool, derivative_word: bool) {
        let mut subscripts: SmallVec<[String; 2]> = SmallVec::new();
        let mut superscripts: SmallVec<[String; 2]> = SmallVec::new();

        // Trailing digits directly after the letter are an index: T1 -> T_1.
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos > digits_start {
            subscripts.push(self.chars[digits_start..self.pos].iter().collect());
        }

        loop {
            match self.peek() {
                Some('_') => {
                    self.pos += 1;
                    if let Some(group) = self.script_group() {
                        subscripts.push(group);
                    }
                }
                Some('^') => {
                    self.pos += 1;
                    if let Some(group) = self.script_group() {
                        if !is_numeric(&group) {
                            superscripts.push(group);
                        }
                    }
                }
                Some(c) if is_superscript_digit(c) => self.pos += 1,
                _ => break,
            }
        }

        let mut primes = String::new();
        while let Some(c @ ('\'' | '′' | '″' | '"')) = self.peek() {
            primes.push(c);
            self.pos += 1;
        }

        let mut symbol = base.clone();
        if !subscripts.is_empty() {
            symbol.push('_');
            symbol.push_str(&subscripts.join(","));
        }
        if !superscripts.is_empty() {
            symbol.push('^');
            symbol.push_str(&superscripts.join(","));
        }
        symbol.push_str(&primes);

        let mut has_derivative = derivative_word;
        if !derivative_word && self.derivative_budget > 0 {
            has_derivative = true;
            self.derivative_budget -= 1;
        }

        self.tokens.push(Token {
            symbol,
            base,
            subscripts,
            superscripts,
            is_greek,
            has_derivative,
            in_function_argument: !self.function_depths.is_empty(),
            start,
            end: self.pos,
        });
    }

    /// The content of a `_`/`^` script: a brace group, a signed digit run,
    /// an alphanumeric run, or a single symbol character.
    fn script_group(&mut self) -> Option<String> {
        match self.peek()? {
            '{' => {
                self.pos += 1;
                let start = self.pos;
                let mut depth = 1usize;
                while let Some(c) = self.peek() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    self.pos += 1;
                }
                let group: String = self.chars[start..self.pos].iter().filter(|c| !c.is_whitespace()).collect();
                self.pos += 1;
                Some(group)
            }
            '-' | '−' if self.peek_at(self.pos + 1).is_some_and(|c| c.is_ascii_digit()) => {
                let start = self.pos;
                self.pos += 1;
                while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
                    self.pos += 1;
                }
                Some(self.chars[start..self.pos].iter().collect())
            }
            c if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
                    self.pos += 1;
                }
                Some(self.chars[start..self.pos].iter().collect())
            }
            c if c.is_ascii_alphanumeric() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
                    self.pos += 1;
                }
                Some(self.chars[start..self.pos].iter().collect())
            }
            c if is_greek(c) || matches!(c, '∞' | '*' | '∗' | '+' | '°') => {
                self.pos += 1;
                Some(c.to_string())
            }
            _ => None,
        }
    }
}

fn is_superscript_digit(c: char) -> bool {
    matches!(c, '⁰' | '¹' | '²' | '³' | '⁴' | '⁵' | '⁶' | '⁷' | '⁸' | '⁹' | '⁻')
}

/// Purely numeric scripts are exponents, not part of a symbol.
fn is_numeric(group: &str) -> bool {
    !group.is_empty()
        && group
            .chars()
            .all(|c| c.is_ascii_digit() || is_superscript_digit(c) || matches!(c, '.' | '-' | '−' | '/'))
}
