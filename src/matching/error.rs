//! Defines the error types for the matching module.
use crate::analysis::UnitError;
use thiserror::Error;

/// A failure scoring one (variable, column) pair. Other pairs are unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Malformed units '{units}' scoring '{symbol}' against column '{column}' of '{table_id}': {source}")]
    MalformedUnits { units: String, symbol: String, table_id: String, column: String, source: UnitError },
}
