//! In-memory store for tests and embedded use.

use crate::agent::registry::AgentCredential;
use crate::cert::criteria::Criterion;
use crate::cert::level::CertLevel;
use crate::cert::request::CertificationRequest;
use crate::cert::signals::QualitySignals;
use crate::grant::record::{ConsumeOutcome, DownloadGrant};
use crate::store::state::TrustState;
use crate::store::{Account, ArtifactRecord, TrustStore};
use crate::TrustError;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

/// [`TrustStore`] backed by a mutex-guarded in-memory document.
///
/// Starts seeded with the stock criteria configuration, so a fresh store
/// evaluates certifications the same way a fresh deployment would.
#[derive(Debug)]
pub struct MemoryTrustStore {
    inner: Mutex<TrustState>,
}

impl MemoryTrustStore {
    /// Create an empty store carrying the stock criteria.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrustState::seeded()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TrustState>, TrustError> {
        self.inner
            .lock()
            .map_err(|_| TrustError::Storage("trust state lock poisoned".to_string()))
    }
}

impl Default for MemoryTrustStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustStore for MemoryTrustStore {
    fn upsert_account(&self, account: Account) -> Result<(), TrustError> {
        self.lock()?.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    fn find_account(&self, id: &str) -> Result<Option<Account>, TrustError> {
        Ok(self.lock()?.accounts.get(id).cloned())
    }

    fn mark_email_confirmed(&self, id: &str) -> Result<bool, TrustError> {
        Ok(self.lock()?.mark_email_confirmed(id))
    }

    fn record_purchase(
        &self,
        owner_id: &str,
        artifact_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), TrustError> {
        self.lock()?.record_purchase(owner_id, artifact_id, at);
        Ok(())
    }

    fn has_purchase(&self, owner_id: &str, artifact_id: &str) -> Result<bool, TrustError> {
        Ok(self.lock()?.has_purchase(owner_id, artifact_id))
    }

    fn upsert_artifact(&self, artifact: ArtifactRecord) -> Result<(), TrustError> {
        self.lock()?.artifacts.insert(artifact.id.clone(), artifact);
        Ok(())
    }

    fn find_artifact(&self, id: &str) -> Result<Option<ArtifactRecord>, TrustError> {
        Ok(self.lock()?.artifacts.get(id).cloned())
    }

    fn update_certification(
        &self,
        artifact_id: &str,
        level: CertLevel,
        score: f64,
    ) -> Result<(), TrustError> {
        self.lock()?.update_certification(artifact_id, level, score)
    }

    fn update_quality_score(&self, artifact_id: &str, score: f64) -> Result<(), TrustError> {
        self.lock()?.update_quality_score(artifact_id, score)
    }

    fn insert_grant(&self, grant: DownloadGrant) -> Result<(), TrustError> {
        self.lock()?.insert_grant(grant)
    }

    fn grants_for(
        &self,
        owner_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<DownloadGrant>, TrustError> {
        Ok(self.lock()?.grants_for(owner_id, artifact_id))
    }

    fn consume_grant(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, TrustError> {
        Ok(self.lock()?.consume_grant(token, now))
    }

    fn revoke_grant(&self, token: &str) -> Result<bool, TrustError> {
        Ok(self.lock()?.revoke_grant(token))
    }

    fn insert_credential(&self, credential: AgentCredential) -> Result<(), TrustError> {
        self.lock()?
            .credentials
            .insert(credential.id.clone(), credential);
        Ok(())
    }

    fn credentials_by_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<AgentCredential>, TrustError> {
        Ok(self.lock()?.credentials_by_fragment(fragment))
    }

    fn revoke_credential(&self, id: &str, at: DateTime<Utc>) -> Result<bool, TrustError> {
        Ok(self.lock()?.revoke_credential(id, at))
    }

    fn touch_credential(&self, id: &str, at: DateTime<Utc>) -> Result<(), TrustError> {
        self.lock()?.touch_credential(id, at);
        Ok(())
    }

    fn criteria(&self) -> Result<Vec<Criterion>, TrustError> {
        Ok(self.lock()?.criteria.clone())
    }

    fn upsert_criterion(&self, criterion: Criterion) -> Result<(), TrustError> {
        self.lock()?.upsert_criterion(criterion);
        Ok(())
    }

    fn load_signals(&self, artifact_id: &str) -> Result<QualitySignals, TrustError> {
        Ok(self
            .lock()?
            .signals
            .get(artifact_id)
            .cloned()
            .unwrap_or_default())
    }

    fn put_signals(&self, artifact_id: &str, signals: QualitySignals) -> Result<(), TrustError> {
        self.lock()?.signals.insert(artifact_id.to_string(), signals);
        Ok(())
    }

    fn insert_request(&self, request: CertificationRequest) -> Result<(), TrustError> {
        self.lock()?.requests.insert(request.id.clone(), request);
        Ok(())
    }

    fn find_request(&self, id: &str) -> Result<Option<CertificationRequest>, TrustError> {
        Ok(self.lock()?.requests.get(id).cloned())
    }

    fn latest_request(
        &self,
        artifact_id: &str,
        level: CertLevel,
    ) -> Result<Option<CertificationRequest>, TrustError> {
        Ok(self.lock()?.latest_request(artifact_id, level))
    }

    fn update_request(&self, request: CertificationRequest) -> Result<(), TrustError> {
        self.lock()?.requests.insert(request.id.clone(), request);
        Ok(())
    }
}
