//! Defines the verdict types produced by the relationship validator.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single check, and of a whole validation.
///
/// Ordered by severity so the overall status is simply the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pass,
    Warn,
    Fail,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Pass => "pass",
            ValidationStatus::Warn => "warn",
            ValidationStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named sub-result of the validation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: ValidationStatus,
    pub message: String,
}

impl CheckResult {
    pub fn pass(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: ValidationStatus::Pass, message: message.into() }
    }

    pub fn warn(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: ValidationStatus::Warn, message: message.into() }
    }

    pub fn fail(name: &str, message: impl Into<String>) -> Self {
        Self { name: name.to_string(), status: ValidationStatus::Fail, message: message.into() }
    }
}

/// The full verdict for one candidate relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub overall_status: ValidationStatus,
    pub checks: Vec<CheckResult>,
    pub warnings: Vec<String>,
    pub issues: Vec<String>,
}

impl ValidationResult {
    /// Aggregates ordered checks: the overall status is the worst one.
    pub fn from_checks(checks: Vec<CheckResult>) -> Self {
        let overall_status = checks.iter().map(|c| c.status).max().unwrap_or(ValidationStatus::Pass);
        let collect = |status: ValidationStatus| -> Vec<String> {
            checks
                .iter()
                .filter(|c| c.status == status)
                .map(|c| format!("{}: {}", c.name, c.message))
                .collect()
        };
        let warnings = collect(ValidationStatus::Warn);
        let issues = collect(ValidationStatus::Fail);
        Self { overall_status, checks, warnings, issues }
    }

    pub fn is_accepted(&self) -> bool {
        self.overall_status != ValidationStatus::Fail
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }
}
