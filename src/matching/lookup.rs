//! Chooses how a matched column is read at use time.

use crate::analysis::units::normalize;
use crate::store::types::{ColumnDataType, EquationVariable, LookupMethod, TableColumnInfo, UnitLinkage};

#[derive(Debug, Clone, PartialEq)]
pub struct LookupPlan {
    pub method: LookupMethod,
    /// Name of the categorical column that selects the row, if any.
    pub key_column: Option<String>,
}

pub fn plan_lookup(column: &TableColumnInfo, columns: &[TableColumnInfo]) -> LookupPlan {
    let method = if column.is_index_column {
        LookupMethod::CategorySelect
    } else {
        match column.data_type {
            ColumnDataType::Continuous => LookupMethod::LinearInterpolate,
            ColumnDataType::Discrete => LookupMethod::ExactMatch,
            ColumnDataType::Categorical | ColumnDataType::Unknown => LookupMethod::CategorySelect,
        }
    };
    let key_column = columns
        .iter()
        .find(|c| c.is_index_column && c.column_index != column.column_index)
        .map(|c| c.name.clone());
    LookupPlan { method, key_column }
}

/// Units on both sides of a pairing. The conversion itself is derived by the
/// validator's coercion check.
pub fn unit_linkage(variable: &EquationVariable, column: &TableColumnInfo) -> UnitLinkage {
    let equation_units = variable.units.clone();
    let table_units = column.units.clone();
    let conversion_needed = match (&equation_units, &table_units) {
        (Some(e), Some(t)) => normalize(e, &[]) != normalize(t, &[]),
        _ => false,
    };
    UnitLinkage { equation_units, table_units, conversion_needed, conversion_factor: None, conversion_offset: None }
}
