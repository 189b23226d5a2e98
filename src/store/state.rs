//! Shared in-memory state document backing both bundled stores.

use crate::agent::registry::AgentCredential;
use crate::cert::criteria::{default_criteria, Criterion};
use crate::cert::level::CertLevel;
use crate::cert::request::CertificationRequest;
use crate::cert::signals::QualitySignals;
use crate::grant::record::{ConsumeOutcome, DownloadGrant};
use crate::store::{Account, ArtifactRecord, Purchase};
use crate::TrustError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The whole trust state as one plain document. The memory store holds one
/// behind a mutex; the file store serializes it as a single JSON file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct TrustState {
    pub accounts: HashMap<String, Account>,
    pub purchases: Vec<Purchase>,
    pub artifacts: HashMap<String, ArtifactRecord>,
    /// Grants keyed by token.
    pub grants: HashMap<String, DownloadGrant>,
    /// Credentials keyed by id.
    pub credentials: HashMap<String, AgentCredential>,
    pub criteria: Vec<Criterion>,
    /// Quality signals keyed by artifact id.
    pub signals: HashMap<String, QualitySignals>,
    /// Review requests keyed by id.
    pub requests: HashMap<String, CertificationRequest>,
}

impl TrustState {
    /// Fresh state carrying the stock criteria configuration.
    pub fn seeded() -> Self {
        Self {
            criteria: default_criteria(),
            ..Self::default()
        }
    }

    pub fn mark_email_confirmed(&mut self, id: &str) -> bool {
        match self.accounts.get_mut(id) {
            Some(account) => {
                account.email_confirmed = true;
                true
            }
            None => false,
        }
    }

    pub fn record_purchase(&mut self, owner_id: &str, artifact_id: &str, at: DateTime<Utc>) {
        if !self.has_purchase(owner_id, artifact_id) {
            self.purchases.push(Purchase {
                owner_id: owner_id.to_string(),
                artifact_id: artifact_id.to_string(),
                purchased_at: at,
            });
        }
    }

    pub fn has_purchase(&self, owner_id: &str, artifact_id: &str) -> bool {
        self.purchases
            .iter()
            .any(|p| p.owner_id == owner_id && p.artifact_id == artifact_id)
    }

    pub fn update_certification(
        &mut self,
        artifact_id: &str,
        level: CertLevel,
        score: f64,
    ) -> Result<(), TrustError> {
        let artifact = self
            .artifacts
            .get_mut(artifact_id)
            .ok_or_else(|| TrustError::ArtifactNotFound(artifact_id.to_string()))?;
        artifact.cert_level = level;
        artifact.quality_score = score;
        Ok(())
    }

    pub fn update_quality_score(
        &mut self,
        artifact_id: &str,
        score: f64,
    ) -> Result<(), TrustError> {
        let artifact = self
            .artifacts
            .get_mut(artifact_id)
            .ok_or_else(|| TrustError::ArtifactNotFound(artifact_id.to_string()))?;
        artifact.quality_score = score;
        Ok(())
    }

    pub fn insert_grant(&mut self, grant: DownloadGrant) -> Result<(), TrustError> {
        if self.grants.contains_key(&grant.token) {
            return Err(TrustError::Storage(format!(
                "duplicate grant token for artifact {}",
                grant.artifact_id
            )));
        }
        self.grants.insert(grant.token.clone(), grant);
        Ok(())
    }

    pub fn grants_for(&self, owner_id: &str, artifact_id: &str) -> Vec<DownloadGrant> {
        self.grants
            .values()
            .filter(|g| g.owner_id == owner_id && g.artifact_id == artifact_id)
            .cloned()
            .collect()
    }

    /// Conditional consume. Callers hold the state lock across this whole
    /// check-and-increment, which is what keeps redemption linearizable.
    pub fn consume_grant(&mut self, token: &str, now: DateTime<Utc>) -> ConsumeOutcome {
        let grant = match self.grants.get_mut(token) {
            Some(grant) => grant,
            None => return ConsumeOutcome::NotFound,
        };
        if grant.revoked {
            return ConsumeOutcome::Revoked;
        }
        if now >= grant.expires_at {
            return ConsumeOutcome::Expired;
        }
        if grant.use_count >= grant.max_uses {
            return ConsumeOutcome::Exhausted;
        }
        grant.use_count += 1;
        ConsumeOutcome::Consumed(grant.clone())
    }

    pub fn revoke_grant(&mut self, token: &str) -> bool {
        match self.grants.get_mut(token) {
            Some(grant) => {
                grant.revoked = true;
                true
            }
            None => false,
        }
    }

    pub fn credentials_by_fragment(&self, fragment: &str) -> Vec<AgentCredential> {
        self.credentials
            .values()
            .filter(|c| c.revoked_at.is_none() && c.prefix == fragment)
            .cloned()
            .collect()
    }

    pub fn revoke_credential(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        match self.credentials.get_mut(id) {
            Some(credential) if credential.revoked_at.is_none() => {
                credential.revoked_at = Some(at);
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn touch_credential(&mut self, id: &str, at: DateTime<Utc>) {
        if let Some(credential) = self.credentials.get_mut(id) {
            credential.last_used_at = Some(at);
        }
    }

    pub fn upsert_criterion(&mut self, criterion: Criterion) {
        match self.criteria.iter_mut().find(|c| c.id == criterion.id) {
            Some(existing) => *existing = criterion,
            None => self.criteria.push(criterion),
        }
    }

    pub fn latest_request(
        &self,
        artifact_id: &str,
        level: CertLevel,
    ) -> Option<CertificationRequest> {
        self.requests
            .values()
            .filter(|r| r.artifact_id == artifact_id && r.target_level == level)
            .max_by_key(|r| r.requested_at)
            .cloned()
    }
}
