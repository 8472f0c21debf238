//! Runs the detection stages over one document's equations and tables.
pub mod detector;
pub mod ledger;
pub mod stats;

pub use detector::{relationship_id, DependencyDetector, DetectionReport, DocumentReport, DETECTOR_VERSION};
pub use ledger::{DetectionFailure, DetectionStage, Ledger};
pub use stats::{confidence_bucket, DetectionStatistics};
