//! Summary counts over one detection run.

use crate::store::relationship::{DataDependency, RejectedDependency};
use crate::store::types::LookupMethod;
use crate::validation::ValidationStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BUCKET_VERY_HIGH: &str = ">=0.95";
pub const BUCKET_HIGH: &str = "0.85-0.95";
pub const BUCKET_ACCEPTED: &str = "0.75-0.85";
pub const BUCKET_BELOW_FLOOR: &str = "<0.75";

/// Every key is present even when its count is zero, so two runs always
/// serialize the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionStatistics {
    pub total_dependencies: usize,
    pub total_rejected: usize,
    /// Accepted and rejected relationships by overall status.
    pub by_validation_status: BTreeMap<String, usize>,
    /// Accepted relationships by confidence bucket.
    pub by_confidence: BTreeMap<String, usize>,
    /// Accepted linkages by lookup method.
    pub by_lookup_method: BTreeMap<String, usize>,
}

pub fn confidence_bucket(score: f64) -> &'static str {
    if score >= 0.95 {
        BUCKET_VERY_HIGH
    } else if score >= 0.85 {
        BUCKET_HIGH
    } else if score >= 0.75 {
        BUCKET_ACCEPTED
    } else {
        BUCKET_BELOW_FLOOR
    }
}

impl DetectionStatistics {
    pub fn collect(accepted: &[DataDependency], rejected: &[RejectedDependency]) -> Self {
        let mut by_validation_status: BTreeMap<String, usize> =
            [ValidationStatus::Pass, ValidationStatus::Warn, ValidationStatus::Fail]
                .iter()
                .map(|s| (s.as_str().to_string(), 0))
                .collect();
        let mut by_confidence: BTreeMap<String, usize> = [BUCKET_VERY_HIGH, BUCKET_HIGH, BUCKET_ACCEPTED, BUCKET_BELOW_FLOOR]
            .iter()
            .map(|b| (b.to_string(), 0))
            .collect();
        let mut by_lookup_method: BTreeMap<String, usize> =
            [LookupMethod::ExactMatch, LookupMethod::LinearInterpolate, LookupMethod::CategorySelect]
                .iter()
                .map(|m| (m.as_str().to_string(), 0))
                .collect();

        for dependency in accepted {
            *by_validation_status.entry(dependency.status().as_str().to_string()).or_default() += 1;
            *by_confidence.entry(confidence_bucket(dependency.confidence.score()).to_string()).or_default() += 1;
            for linkage in &dependency.variable_linkage {
                *by_lookup_method.entry(linkage.lookup_method.as_str().to_string()).or_default() += 1;
            }
        }
        for rejection in rejected {
            *by_validation_status.entry(rejection.validation.overall_status.as_str().to_string()).or_default() += 1;
        }

        let below_floor = by_confidence[BUCKET_BELOW_FLOOR];
        if below_floor > 0 {
            tracing::error!(count = below_floor, "Accepted relationships scored below the confidence floor");
        }

        Self {
            total_dependencies: accepted.len(),
            total_rejected: rejected.len(),
            by_validation_status,
            by_confidence,
            by_lookup_method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, ">=0.95")]
    #[case(0.95, ">=0.95")]
    #[case(0.9, "0.85-0.95")]
    #[case(0.85, "0.85-0.95")]
    #[case(0.8, "0.75-0.85")]
    #[case(0.75, "0.75-0.85")]
    #[case(0.5, "<0.75")]
    fn test_confidence_bucket(#[case] score: f64, #[case] expected: &str) {
        assert_eq!(confidence_bucket(score), expected);
    }

    #[test]
    fn test_empty_run_has_every_key() {
        let stats = DetectionStatistics::collect(&[], &[]);
        assert_eq!(stats.total_dependencies, 0);
        assert_eq!(stats.by_validation_status.len(), 3);
        assert_eq!(stats.by_confidence.len(), 4);
        assert_eq!(stats.by_lookup_method.keys().collect::<Vec<_>>(), vec!["category-select", "exact-match", "linear-interpolate"]);
    }
}
