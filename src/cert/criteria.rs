//! Weighted certification criteria and their classification.

use crate::cert::level::CertLevel;
use crate::cert::signals::QualitySignals;
use serde::{Deserialize, Serialize};

/// How a criterion is checked.
///
/// Every variant except [`CriterionCheck::ManualReview`] is auto-checkable
/// against [`QualitySignals`]; `ManualReview` resolves through the
/// certification request workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriterionCheck {
    /// Documentation is present.
    Documentation,
    /// Test coverage meets a floor.
    TestCoverage {
        /// Minimum coverage percentage, 0–100.
        min_percent: f64,
    },
    /// Completed sales meet a floor.
    SalesCount {
        /// Minimum number of completed purchases.
        min: u64,
    },
    /// Average rating meets a floor.
    AverageRating {
        /// Minimum average rating, 0–5.
        min: f64,
    },
    /// No critical defect for a minimum number of days.
    DefectFreeDays {
        /// Minimum defect-free days.
        min: i64,
    },
    /// Localization is complete.
    Localization,
    /// Requires administrative review via a certification request.
    ManualReview,
}

impl CriterionCheck {
    /// Whether this check runs automatically against signals.
    pub fn auto_checkable(&self) -> bool {
        !matches!(self, Self::ManualReview)
    }

    /// Evaluate against a signal snapshot.
    ///
    /// `None` means the check cannot be decided here: either the signal is
    /// missing or the check is manual.
    pub fn evaluate(&self, signals: &QualitySignals) -> Option<bool> {
        match self {
            Self::Documentation => signals.documentation,
            Self::TestCoverage { min_percent } => {
                signals.test_coverage.map(|c| c >= *min_percent)
            }
            Self::SalesCount { min } => signals.sales_count.map(|n| n >= *min),
            Self::AverageRating { min } => signals.average_rating.map(|r| r >= *min),
            Self::DefectFreeDays { min } => {
                signals.days_since_critical_defect.map(|d| d >= *min)
            }
            Self::Localization => signals.localization_complete,
            Self::ManualReview => None,
        }
    }
}

/// One named, weighted condition contributing to a level's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// Stable identifier.
    pub id: String,

    /// The level this criterion gates.
    pub level: CertLevel,

    /// Positive weight in the level's score.
    pub weight: f64,

    /// Human-readable name.
    pub name: String,

    /// What the criterion measures.
    pub description: String,

    /// How the criterion is checked.
    pub check: CriterionCheck,
}

/// Classification of one criterion for one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionResult {
    /// The criterion is satisfied.
    Passed,
    /// The criterion is not satisfied.
    Failed,
    /// Signal missing, or manual review not yet approved.
    Pending,
}

/// A criterion paired with its classification, as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionOutcome {
    /// The criterion's stable id.
    pub criterion_id: String,

    /// The criterion's display name.
    pub name: String,

    /// Classification for the evaluated artifact.
    pub result: CriterionResult,
}

/// The stock criteria set a fresh deployment ships with.
///
/// Rarely mutated configuration; deployments may replace it wholesale
/// through the store.
pub fn default_criteria() -> Vec<Criterion> {
    fn criterion(
        id: &str,
        level: CertLevel,
        weight: f64,
        name: &str,
        description: &str,
        check: CriterionCheck,
    ) -> Criterion {
        Criterion {
            id: id.to_string(),
            level,
            weight,
            name: name.to_string(),
            description: description.to_string(),
            check,
        }
    }

    vec![
        criterion(
            "bronze-docs",
            CertLevel::Bronze,
            3.0,
            "Documentation present",
            "The skill ships usage documentation.",
            CriterionCheck::Documentation,
        ),
        criterion(
            "bronze-coverage",
            CertLevel::Bronze,
            2.0,
            "Baseline test coverage",
            "Measured test coverage of at least 50%.",
            CriterionCheck::TestCoverage { min_percent: 50.0 },
        ),
        criterion(
            "silver-coverage",
            CertLevel::Silver,
            3.0,
            "Solid test coverage",
            "Measured test coverage of at least 75%.",
            CriterionCheck::TestCoverage { min_percent: 75.0 },
        ),
        criterion(
            "silver-sales",
            CertLevel::Silver,
            2.0,
            "Market traction",
            "At least 10 completed purchases.",
            CriterionCheck::SalesCount { min: 10 },
        ),
        criterion(
            "silver-rating",
            CertLevel::Silver,
            2.0,
            "Buyer satisfaction",
            "Average rating of at least 3.5.",
            CriterionCheck::AverageRating { min: 3.5 },
        ),
        criterion(
            "gold-coverage",
            CertLevel::Gold,
            3.0,
            "Near-complete test coverage",
            "Measured test coverage of at least 90%.",
            CriterionCheck::TestCoverage { min_percent: 90.0 },
        ),
        criterion(
            "gold-sales",
            CertLevel::Gold,
            2.0,
            "Established market presence",
            "At least 100 completed purchases.",
            CriterionCheck::SalesCount { min: 100 },
        ),
        criterion(
            "gold-rating",
            CertLevel::Gold,
            3.0,
            "Outstanding buyer satisfaction",
            "Average rating of at least 4.5.",
            CriterionCheck::AverageRating { min: 4.5 },
        ),
        criterion(
            "gold-defect-free",
            CertLevel::Gold,
            2.0,
            "Stable under load",
            "No critical defect for at least 90 days.",
            CriterionCheck::DefectFreeDays { min: 90 },
        ),
        criterion(
            "gold-i18n",
            CertLevel::Gold,
            1.0,
            "Localization complete",
            "Translations exist for every supported locale.",
            CriterionCheck::Localization,
        ),
        criterion(
            "gold-security-audit",
            CertLevel::Gold,
            3.0,
            "Security audit",
            "An administrator reviewed the skill's security posture.",
            CriterionCheck::ManualReview,
        ),
    ]
}

/// Group criteria by level, descending weight within each group.
///
/// This is the listing order of the public criteria catalog.
pub fn catalog_order(mut criteria: Vec<Criterion>) -> Vec<(CertLevel, Vec<Criterion>)> {
    criteria.sort_by(|a, b| {
        a.level
            .cmp(&b.level)
            .then(b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut grouped: Vec<(CertLevel, Vec<Criterion>)> = Vec::new();
    for criterion in criteria {
        match grouped.last_mut() {
            Some((level, bucket)) if *level == criterion.level => bucket.push(criterion),
            _ => grouped.push((criterion.level, vec![criterion])),
        }
    }
    grouped
}
