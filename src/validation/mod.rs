//! The mandatory validation gate.
//!
//! Every candidate relationship runs through an ordered set of checks
//! (dimensions, unit coercion, range applicability). A `fail` verdict drops
//! the relationship; `warn` keeps it with diagnostics attached.

// Publicly export the primary components for use by other modules.
pub use self::result::{CheckResult, ValidationResult, ValidationStatus};
pub use self::validator::{RelationshipValidator, ValidationContext};

// --- MODULE DECLARATIONS ---
mod result;
mod validator;
mod rules {
    pub mod coercion;
    pub mod dimensions;
    pub mod regime;
}
