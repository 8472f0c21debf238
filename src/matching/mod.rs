//! Pairs equation variables with table columns and decides how each matched
//! column is looked up.
pub mod error;
pub mod lookup;
pub mod scorer;
pub mod similarity;

pub use error::MatchError;
pub use lookup::{plan_lookup, unit_linkage, LookupPlan};
pub use scorer::{MatchCandidate, MatchReport, VariableMatch, VariableMatcher};
