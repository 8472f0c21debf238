//! Validation rule for converting table values into equation units.

use crate::analysis::units::{conversion_between, normalize, ParsedUnit};
use crate::store::types::UnitLinkage;
use crate::validation::result::CheckResult;

pub(crate) const CHECK_NAME: &str = "unit_coercion";

/// Derives the table -> equation conversion and records it on the linkage.
pub(crate) fn check_coercion(units: &mut UnitLinkage) -> CheckResult {
    let (Some(equation_units), Some(table_units)) = (units.equation_units.clone(), units.table_units.clone()) else {
        units.conversion_needed = false;
        return CheckResult::warn(CHECK_NAME, "units are not stated on both sides");
    };

    if normalize(&equation_units, &[]) == normalize(&table_units, &[]) {
        units.conversion_needed = false;
        units.conversion_factor = Some(1.0);
        units.conversion_offset = Some(0.0);
        return CheckResult::pass(CHECK_NAME, format!("identical units '{equation_units}'"));
    }

    let (to, from) = match (ParsedUnit::parse(&equation_units), ParsedUnit::parse(&table_units)) {
        (Ok(to), Ok(from)) => (to, from),
        (Err(e), _) | (_, Err(e)) => {
            units.conversion_needed = true;
            return CheckResult::warn(CHECK_NAME, format!("no conversion derivable: {e}"));
        }
    };
    if !from.is_compatible_with(&to) {
        units.conversion_needed = true;
        return CheckResult::fail(
            CHECK_NAME,
            format!("'{table_units}' ({}) cannot be converted to '{equation_units}' ({})", from.dimension, to.dimension),
        );
    }

    match conversion_between(&from, &to) {
        Some(conversion) => {
            units.conversion_needed = !conversion.is_identity();
            units.conversion_factor = Some(conversion.factor);
            units.conversion_offset = Some(conversion.offset);
            CheckResult::pass(
                CHECK_NAME,
                format!(
                    "'{table_units}' -> '{equation_units}': multiply by {} and add {}",
                    conversion.factor, conversion.offset
                ),
            )
        }
        None => {
            units.conversion_needed = true;
            CheckResult::warn(CHECK_NAME, format!("'{table_units}' and '{equation_units}' are compatible but no factor is derivable"))
        }
    }
}
