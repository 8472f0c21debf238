//! The validation gate every candidate relationship passes through.
use super::result::ValidationResult;
use super::rules::{coercion, dimensions, regime};
use crate::analysis::units::{Dimension, ParsedUnit};
use crate::store::records::{Equation, Table};
use crate::store::registry::ConceptRegistry;
use crate::store::relationship::{CandidateDependency, DataDependency, RejectedDependency};
use crate::store::types::{EquationVariable, TableColumnInfo, UnitLinkage};
use crate::validation::result::CheckResult;

/// The objects a candidate was built from.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub equation: &'a Equation,
    pub table: &'a Table,
    pub variable: &'a EquationVariable,
    pub column: &'a TableColumnInfo,
}

/// Runs the ordered checks on a candidate and either accepts it or rejects
/// it with the failing result attached.
pub struct RelationshipValidator<'a> {
    registry: &'a ConceptRegistry,
}

impl<'a> RelationshipValidator<'a> {
    pub fn new(registry: &'a ConceptRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(
        &self,
        mut candidate: CandidateDependency,
        ctx: &ValidationContext<'_>,
    ) -> Result<DataDependency, RejectedDependency> {
        let result = match candidate.variable_linkage.first_mut() {
            Some(linkage) => self.run_checks(ctx, &mut linkage.units),
            None => ValidationResult::from_checks(vec![CheckResult::fail("variable_linkage", "candidate links no variable")]),
        };
        if result.is_accepted() {
            Ok(DataDependency::accept(candidate, result))
        } else {
            Err(RejectedDependency::reject(candidate, result))
        }
    }

    /// Runs every check in order. The coercion check records the derived
    /// conversion on `units`.
    pub fn run_checks(&self, ctx: &ValidationContext<'_>, units: &mut UnitLinkage) -> ValidationResult {
        let equation_dim = self.dimension_of(units.equation_units.as_deref(), ctx.variable.canonical_id.as_deref());
        let table_dim = self.dimension_of(units.table_units.as_deref(), ctx.column.canonical_id.as_deref());

        let table_range = ctx.table.documented_range();
        let checks = vec![
            dimensions::check_dimensions(equation_dim.as_ref(), table_dim.as_ref()),
            coercion::check_coercion(units),
            regime::check_range(table_range.as_ref(), ctx.equation.operating_range.as_ref()),
        ];
        ValidationResult::from_checks(checks)
    }

    /// Dimension of the stated units, else of the resolved concept.
    fn dimension_of(&self, units: Option<&str>, canonical_id: Option<&str>) -> Option<Dimension> {
        units
            .and_then(|u| ParsedUnit::parse(u).ok())
            .map(|u| u.dimension)
            .or_else(|| canonical_id.and_then(|id| self.registry.get(id)).map(|c| c.dimension.clone()))
    }
}
