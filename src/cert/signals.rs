//! Live marketplace quality signals.
//!
//! Signals are sourced from persistence, never recomputed here. Every field
//! is optional: a missing signal classifies its criterion as pending rather
//! than failing the evaluation.

use serde::{Deserialize, Serialize};

/// Snapshot of the quality signals recorded for one artifact.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualitySignals {
    /// Whether the skill ships documentation.
    pub documentation: Option<bool>,

    /// Measured test coverage, 0–100.
    pub test_coverage: Option<f64>,

    /// Completed purchases.
    pub sales_count: Option<u64>,

    /// Average buyer rating, 0–5.
    pub average_rating: Option<f64>,

    /// Days since the last critical defect report.
    pub days_since_critical_defect: Option<i64>,

    /// Whether localization is complete for all supported locales.
    pub localization_complete: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_unknown() {
        let signals = QualitySignals::default();
        assert!(signals.documentation.is_none());
        assert!(signals.test_coverage.is_none());
        assert!(signals.sales_count.is_none());
        assert!(signals.average_rating.is_none());
        assert!(signals.days_since_critical_defect.is_none());
        assert!(signals.localization_complete.is_none());
    }

    #[test]
    fn serde_round_trip() {
        let signals = QualitySignals {
            documentation: Some(true),
            test_coverage: Some(82.5),
            sales_count: Some(14),
            average_rating: Some(4.2),
            days_since_critical_defect: Some(120),
            localization_complete: None,
        };
        let json = serde_json::to_string(&signals).unwrap();
        let back: QualitySignals = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signals);
    }
}
