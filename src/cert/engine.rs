//! Certification evaluation, scoring, and promotion.
//!
//! Everything is recomputed from scratch on each call; the score persisted
//! on the artifact record is a display cache, never an input. Promotion is
//! strictly forward: a regression after promotion shows up in
//! `criteria_results` but never lowers the persisted level. Demotion is an
//! administrative decision taken outside this engine.

use crate::cert::criteria::{catalog_order, Criterion, CriterionOutcome, CriterionResult};
use crate::cert::level::CertLevel;
use crate::cert::request::{CertificationRequest, RequestStatus};
use crate::clock::Clock;
use crate::store::TrustStore;
use crate::TrustError;
use std::sync::Arc;

/// Derived certification state for one artifact.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CertificationStatus {
    /// The evaluated artifact.
    pub artifact_id: String,

    /// Weighted score, 0–100, at the target level.
    pub quality_score: f64,

    /// The currently achieved (persisted) level.
    pub level: CertLevel,

    /// The next unachieved level, or `None` at Gold.
    pub target_level: Option<CertLevel>,

    /// Classification of each criterion at the target level.
    pub criteria_results: Vec<CriterionOutcome>,
}

/// Computes scores and drives the level state machine.
pub struct CertificationEngine {
    store: Arc<dyn TrustStore>,
    clock: Arc<dyn Clock>,
}

impl CertificationEngine {
    /// Create the engine.
    pub fn new(store: Arc<dyn TrustStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Evaluate an artifact against its next unachieved level.
    ///
    /// Persists the recomputed score as a display cache. Never changes the
    /// persisted level; see [`CertificationEngine::promote`] for that.
    ///
    /// # Errors
    /// - [`TrustError::ArtifactNotFound`] — unknown artifact.
    /// - [`TrustError::Storage`] — persistence failure.
    pub fn evaluate(&self, artifact_id: &str) -> Result<CertificationStatus, TrustError> {
        let artifact = self
            .store
            .find_artifact(artifact_id)?
            .ok_or_else(|| TrustError::ArtifactNotFound(artifact_id.to_string()))?;

        let target = artifact.cert_level.next();
        // Once Gold is achieved the score keeps reporting over the Gold set.
        let score_level = target.unwrap_or(CertLevel::Gold);
        let (criteria_results, quality_score) = self.classify_level(artifact_id, score_level)?;

        // Score-only write: the level is written exclusively by `promote`,
        // so an evaluate racing a promotion cannot clobber the fresh level
        // with the one it read.
        self.store.update_quality_score(artifact_id, quality_score)?;

        Ok(CertificationStatus {
            artifact_id: artifact_id.to_string(),
            quality_score,
            level: artifact.cert_level,
            target_level: target,
            criteria_results,
        })
    }

    /// Recompute and return the weighted quality score.
    ///
    /// # Errors
    /// Same as [`CertificationEngine::evaluate`].
    pub fn score(&self, artifact_id: &str) -> Result<f64, TrustError> {
        Ok(self.evaluate(artifact_id)?.quality_score)
    }

    /// Walk the level state machine forward as far as the criteria allow.
    ///
    /// A level is achieved only when every criterion at it is `Passed`;
    /// manual criteria pass only through an approved review request. Returns
    /// the level persisted after the walk (unchanged if nothing was
    /// promotable). Never demotes.
    ///
    /// # Errors
    /// Same as [`CertificationEngine::evaluate`].
    pub fn promote(&self, artifact_id: &str) -> Result<CertLevel, TrustError> {
        let artifact = self
            .store
            .find_artifact(artifact_id)?
            .ok_or_else(|| TrustError::ArtifactNotFound(artifact_id.to_string()))?;

        let mut level = artifact.cert_level;
        while let Some(next) = level.next() {
            let (results, score) = self.classify_level(artifact_id, next)?;
            let all_passed = results
                .iter()
                .all(|outcome| outcome.result == CriterionResult::Passed);
            if !all_passed {
                break;
            }
            level = next;
            self.store.update_certification(artifact_id, level, score)?;
            tracing::info!(artifact_id, %level, "certification level promoted");
        }
        Ok(level)
    }

    /// The public criteria catalog: grouped by level, descending weight.
    ///
    /// # Errors
    /// Propagates persistence failures as [`TrustError::Storage`].
    pub fn criteria_catalog(&self) -> Result<Vec<(CertLevel, Vec<Criterion>)>, TrustError> {
        Ok(catalog_order(self.store.criteria()?))
    }

    /// Open a manual review request for an artifact's target level.
    ///
    /// # Errors
    /// - [`TrustError::ArtifactNotFound`] — unknown artifact.
    /// - [`TrustError::Storage`] — persistence failure.
    pub fn request_review(
        &self,
        artifact_id: &str,
        requested_by: &str,
        target_level: CertLevel,
    ) -> Result<CertificationRequest, TrustError> {
        if self.store.find_artifact(artifact_id)?.is_none() {
            return Err(TrustError::ArtifactNotFound(artifact_id.to_string()));
        }
        let request = CertificationRequest::new(
            artifact_id,
            requested_by,
            target_level,
            self.clock.now_utc(),
        );
        self.store.insert_request(request.clone())?;
        tracing::info!(artifact_id, %target_level, "certification review requested");
        Ok(request)
    }

    /// Decide a pending review request. Approval triggers a promotion pass.
    ///
    /// # Errors
    /// - [`TrustError::RequestNotFound`] — unknown request id.
    /// - [`TrustError::RequestAlreadyReviewed`] — request is terminal.
    /// - [`TrustError::Storage`] — persistence failure.
    pub fn review(
        &self,
        request_id: &str,
        reviewer: &str,
        approve: bool,
    ) -> Result<CertificationRequest, TrustError> {
        let mut request = self
            .store
            .find_request(request_id)?
            .ok_or_else(|| TrustError::RequestNotFound(request_id.to_string()))?;
        if request.is_terminal() {
            return Err(TrustError::RequestAlreadyReviewed);
        }

        request.status = if approve {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };
        request.reviewed_by = Some(reviewer.to_string());
        request.reviewed_at = Some(self.clock.now_utc());
        self.store.update_request(request.clone())?;
        tracing::info!(
            request_id,
            artifact_id = %request.artifact_id,
            approved = approve,
            "certification review decided"
        );

        if approve {
            self.promote(&request.artifact_id)?;
        }
        Ok(request)
    }

    /// Classify every criterion at one level and compute the weighted score.
    fn classify_level(
        &self,
        artifact_id: &str,
        level: CertLevel,
    ) -> Result<(Vec<CriterionOutcome>, f64), TrustError> {
        let mut criteria: Vec<Criterion> = self
            .store
            .criteria()?
            .into_iter()
            .filter(|c| c.level == level)
            .collect();
        criteria.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let signals = self.store.load_signals(artifact_id)?;

        let mut outcomes = Vec::with_capacity(criteria.len());
        let mut total_weight = 0.0;
        let mut passed_weight = 0.0;
        for criterion in criteria {
            let result = if criterion.check.auto_checkable() {
                match criterion.check.evaluate(&signals) {
                    Some(true) => CriterionResult::Passed,
                    Some(false) => CriterionResult::Failed,
                    // Missing signal is pending, never an error.
                    None => CriterionResult::Pending,
                }
            } else {
                match self.store.latest_request(artifact_id, level)? {
                    Some(request) if request.status == RequestStatus::Approved => {
                        CriterionResult::Passed
                    }
                    Some(request) if request.status == RequestStatus::Rejected => {
                        CriterionResult::Failed
                    }
                    _ => CriterionResult::Pending,
                }
            };

            total_weight += criterion.weight;
            if result == CriterionResult::Passed {
                passed_weight += criterion.weight;
            }
            outcomes.push(CriterionOutcome {
                criterion_id: criterion.id,
                name: criterion.name,
                result,
            });
        }

        let score = if total_weight > 0.0 {
            100.0 * passed_weight / total_weight
        } else {
            100.0
        };
        Ok((outcomes, score))
    }
}
