//! Validation rule for the applicability range of tabulated data.

use crate::analysis::units::{conversion_between, ParsedUnit};
use crate::store::records::ValidityRange;
use crate::validation::result::CheckResult;

pub(crate) const CHECK_NAME: &str = "range_applicability";

const EPSILON: f64 = 1e-9;

/// Compares the table's documented validity range with the equation's
/// operating range.
pub(crate) fn check_range(table_range: Option<&ValidityRange>, operating_range: Option<&ValidityRange>) -> CheckResult {
    let Some(table) = table_range else {
        return CheckResult::warn(CHECK_NAME, "table documents no validity range");
    };
    let Some(operating) = operating_range else {
        return CheckResult::pass(
            CHECK_NAME,
            format!("table valid for {}; equation states no operating range", describe(table)),
        );
    };
    let Some(operating) = in_units_of(operating, table) else {
        return CheckResult::warn(
            CHECK_NAME,
            format!("ranges {} and {} are in incomparable units", describe(operating), describe(table)),
        );
    };

    if operating.min >= table.min - EPSILON && operating.max <= table.max + EPSILON {
        CheckResult::pass(CHECK_NAME, format!("operating range {} lies within {}", describe(&operating), describe(table)))
    } else if operating.min <= table.max + EPSILON && operating.max >= table.min - EPSILON {
        CheckResult::warn(
            CHECK_NAME,
            format!("operating range {} only partly overlaps {}", describe(&operating), describe(table)),
        )
    } else {
        CheckResult::fail(CHECK_NAME, format!("operating range {} lies outside {}", describe(&operating), describe(table)))
    }
}

/// Re-expresses `range` in the units of `reference`, or `None` when the two
/// cannot be compared.
fn in_units_of(range: &ValidityRange, reference: &ValidityRange) -> Option<ValidityRange> {
    match (range.units.as_deref(), reference.units.as_deref()) {
        (None, None) => Some(range.clone()),
        (Some(from), Some(to)) => {
            let conversion = conversion_between(&ParsedUnit::parse(from).ok()?, &ParsedUnit::parse(to).ok()?)?;
            let mut converted = ValidityRange::new(conversion.apply(range.min), conversion.apply(range.max), Some(to));
            converted.quantity = range.quantity.clone();
            Some(converted)
        }
        _ => None,
    }
}

fn describe(range: &ValidityRange) -> String {
    match &range.units {
        Some(units) => format!("[{}, {}] {units}", range.min, range.max),
        None => format!("[{}, {}]", range.min, range.max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::result::ValidationStatus;
    use rstest::rstest;

    fn range(min: f64, max: f64, units: Option<&str>) -> ValidityRange {
        ValidityRange::new(min, max, units)
    }

    #[rstest]
    #[case(range(300.0, 1000.0, Some("K")), range(400.0, 600.0, Some("K")), ValidationStatus::Pass)]
    #[case(range(300.0, 1000.0, Some("K")), range(200.0, 600.0, Some("K")), ValidationStatus::Warn)]
    #[case(range(300.0, 1000.0, Some("K")), range(1200.0, 1500.0, Some("K")), ValidationStatus::Fail)]
    #[case(range(300.0, 1000.0, Some("K")), range(50.0, 100.0, Some("°C")), ValidationStatus::Pass)]
    #[case(range(300.0, 1000.0, Some("K")), range(1.0, 2.0, Some("m")), ValidationStatus::Warn)]
    #[case(range(300.0, 1000.0, Some("K")), range(400.0, 500.0, None), ValidationStatus::Warn)]
    #[case(range(0.0, 1.0, None), range(0.2, 0.4, None), ValidationStatus::Pass)]
    fn test_range_comparison(
        #[case] table: ValidityRange,
        #[case] operating: ValidityRange,
        #[case] expected: ValidationStatus,
    ) {
        let result = check_range(Some(&table), Some(&operating));
        assert_eq!(result.status, expected, "{}", result.message);
    }

    #[test]
    fn test_missing_ranges() {
        let table = range(300.0, 1000.0, Some("K"));
        assert_eq!(check_range(Some(&table), None).status, ValidationStatus::Pass);
        assert_eq!(check_range(None, Some(&table)).status, ValidationStatus::Warn);
        assert_eq!(check_range(None, None).status, ValidationStatus::Warn);
    }
}
