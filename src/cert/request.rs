//! Administrative certification review workflow.

use crate::cert::level::CertLevel;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a review request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting review.
    Pending,
    /// Approved; the associated manual criteria count as passed.
    Approved,
    /// Rejected; manual criteria stay failed until resubmission.
    Rejected,
}

/// A request for manual review of an artifact's target level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationRequest {
    /// Stable request id.
    pub id: String,

    /// The artifact under review.
    pub artifact_id: String,

    /// Who asked for the review.
    pub requested_by: String,

    /// When the request was created.
    pub requested_at: DateTime<Utc>,

    /// The reviewer, once a decision was made.
    pub reviewed_by: Option<String>,

    /// When the decision was made.
    pub reviewed_at: Option<DateTime<Utc>>,

    /// Current lifecycle state.
    pub status: RequestStatus,

    /// The level under review.
    pub target_level: CertLevel,
}

impl CertificationRequest {
    /// Create a fresh pending request.
    pub fn new(
        artifact_id: &str,
        requested_by: &str,
        target_level: CertLevel,
        requested_at: DateTime<Utc>,
    ) -> Self {
        let mut id_bytes = [0u8; 8];
        rand::rngs::OsRng.fill_bytes(&mut id_bytes);
        Self {
            id: hex::encode(id_bytes),
            artifact_id: artifact_id.to_string(),
            requested_by: requested_by.to_string(),
            requested_at,
            reviewed_by: None,
            reviewed_at: None,
            status: RequestStatus::Pending,
            target_level,
        }
    }

    /// Whether the request has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RequestStatus::Approved | RequestStatus::Rejected)
    }
}
