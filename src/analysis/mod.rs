//! Reads the raw document objects: equation variables, table columns and the
//! unit algebra both sides are compared with.
pub mod equation;
pub mod error;
pub mod headers;
pub mod latex;
pub mod table;
pub mod units;

// Re-export key types for convenient access
pub use equation::VariableExtractor;
pub use error::{ExtractionError, UnitError};
pub use headers::{HeaderParser, HeaderRule, ParsedHeader};
pub use table::TableAnalyzer;
pub use units::{conversion_between, Conversion, Dimension, ParsedUnit};
