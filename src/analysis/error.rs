//! Defines the error types for the analysis module.
use crate::analysis::units::{BaseDimension, MAX_EXPONENT};
use thiserror::Error;

/// Failure to interpret a unit string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Empty unit string")]
    Empty,
    #[error("Unit '{0}' has more than one '/'")]
    MultipleDivisions(String),
    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),
    #[error("Invalid exponent in '{0}'")]
    InvalidExponent(String),
    #[error("Exponent of dimension '{}' exceeds {} in magnitude", .0.symbol(), MAX_EXPONENT)]
    ExponentOverflow(BaseDimension),
}

/// Malformed equation or table input.
///
/// The extractors recover from these locally: the offending record yields no
/// variables or columns and processing continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Equation '{0}' has no symbolic content")]
    EmptyEquation(String),
    #[error("Unbalanced '{delimiter}' in equation '{equation_id}'")]
    UnbalancedDelimiter { equation_id: String, delimiter: char },
    #[error("Malformed markup in equation '{equation_id}': {message}")]
    MalformedMarkup { equation_id: String, message: String },
    #[error("Table '{0}' has no headers")]
    EmptyHeaders(String),
    #[error("Row {row} of table '{table_id}' has {cells} cells but only {headers} headers")]
    RaggedRow { table_id: String, row: usize, cells: usize, headers: usize },
}
