//! Validation rule for dimensional consistency between the two sides of a linkage.

use crate::analysis::units::Dimension;
use crate::validation::result::CheckResult;

pub(crate) const CHECK_NAME: &str = "dimensional_consistency";

/// "The Apples and Oranges Rule": the equation variable and the table column
/// must measure the same kind of quantity. Unknown dimensions only warn.
pub(crate) fn check_dimensions(equation_side: Option<&Dimension>, table_side: Option<&Dimension>) -> CheckResult {
    match (equation_side, table_side) {
        (Some(e), Some(t)) if e == t => CheckResult::pass(CHECK_NAME, format!("both sides are {e}")),
        (Some(e), Some(t)) => CheckResult::fail(CHECK_NAME, format!("equation side is {e} but table side is {t}")),
        (None, Some(_)) => CheckResult::warn(CHECK_NAME, "equation-side dimension could not be determined"),
        (Some(_), None) => CheckResult::warn(CHECK_NAME, "table-side dimension could not be determined"),
        (None, None) => CheckResult::warn(CHECK_NAME, "neither dimension could be determined"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::units::ParsedUnit;
    use crate::validation::result::ValidationStatus;

    fn dim(unit: &str) -> Dimension {
        ParsedUnit::parse(unit).unwrap().dimension
    }

    #[test]
    fn test_same_dimension_passes() {
        let result = check_dimensions(Some(&dim("W/m·K")), Some(&dim("W/m·°C")));
        assert_eq!(result.status, ValidationStatus::Pass);
    }

    #[test]
    fn test_different_dimension_fails() {
        let result = check_dimensions(Some(&dim("W/m·K")), Some(&dim("N/m")));
        assert_eq!(result.status, ValidationStatus::Fail);
        assert!(result.message.contains("table side"));
    }

    #[test]
    fn test_unknown_dimension_warns() {
        assert_eq!(check_dimensions(None, Some(&dim("K"))).status, ValidationStatus::Warn);
        assert_eq!(check_dimensions(None, None).status, ValidationStatus::Warn);
    }
}
