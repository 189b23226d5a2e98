//! Certification levels, from least to most trusted.

use serde::{Deserialize, Serialize};

/// Certification tier a published skill may claim. Strictly ordered;
/// promotion only ever moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum CertLevel {
    /// Not certified. Every skill starts here.
    #[default]
    None,
    /// Baseline quality: documented, minimally tested.
    Bronze,
    /// Proven in the market: solid coverage, real sales, good ratings.
    Silver,
    /// Flagship quality: near-complete coverage, strong track record,
    /// localized, security-audited.
    Gold,
}

impl CertLevel {
    /// Numeric rank for ordering.
    pub fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Bronze => 1,
            Self::Silver => 2,
            Self::Gold => 3,
        }
    }

    /// The next level up, or `None` at the top.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::None => Some(Self::Bronze),
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => None,
        }
    }

    /// Check if this level meets a minimum requirement.
    pub fn meets_minimum(self, minimum: Self) -> bool {
        self.rank() >= minimum.rank()
    }
}

impl std::fmt::Display for CertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Bronze => write!(f, "bronze"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_strictly_ordered() {
        assert!(CertLevel::None < CertLevel::Bronze);
        assert!(CertLevel::Bronze < CertLevel::Silver);
        assert!(CertLevel::Silver < CertLevel::Gold);
    }

    #[test]
    fn next_walks_forward_and_stops() {
        assert_eq!(CertLevel::None.next(), Some(CertLevel::Bronze));
        assert_eq!(CertLevel::Bronze.next(), Some(CertLevel::Silver));
        assert_eq!(CertLevel::Silver.next(), Some(CertLevel::Gold));
        assert_eq!(CertLevel::Gold.next(), None);
    }

    #[test]
    fn meets_minimum() {
        assert!(CertLevel::Gold.meets_minimum(CertLevel::Silver));
        assert!(CertLevel::Silver.meets_minimum(CertLevel::Silver));
        assert!(!CertLevel::Bronze.meets_minimum(CertLevel::Silver));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&CertLevel::Gold).unwrap(), "\"gold\"");
        let parsed: CertLevel = serde_json::from_str("\"bronze\"").unwrap();
        assert_eq!(parsed, CertLevel::Bronze);
    }
}
