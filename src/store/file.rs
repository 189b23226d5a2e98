//! Single-document JSON file store for small deployments.

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
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const STATE_FILE: &str = "trust.json";

/// [`TrustStore`] that keeps the whole state as one JSON document on disk.
///
/// Writes go to a temp file in the same directory and land via rename, so a
/// crash mid-write leaves the previous document intact. Mutations are staged
/// on a copy and committed only after the write succeeds; a failed write
/// changes nothing, in memory or on disk.
pub struct FileTrustStore {
    path: PathBuf,
    inner: Mutex<TrustState>,
}

impl FileTrustStore {
    /// Open (or create) the store under the platform data directory,
    /// namespaced by `namespace` (e.g. the marketplace name).
    pub fn open(namespace: &str) -> Result<Self, TrustError> {
        let dir = dirs::data_dir()
            .ok_or_else(|| TrustError::Storage("no platform data directory".to_string()))?
            .join(namespace);
        Self::open_at(dir.join(STATE_FILE))
    }

    /// Open (or create) the store at an explicit file path.
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self, TrustError> {
        let path = path.into();
        let state = Self::load(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new(state),
        })
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<TrustState, TrustError> {
        if !path.exists() {
            return Ok(TrustState::seeded());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| TrustError::Storage(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| TrustError::Storage(format!("parse {}: {e}", path.display())))
    }

    fn persist(&self, state: &TrustState) -> Result<(), TrustError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| TrustError::Storage(format!("serialize state: {e}")))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| TrustError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| TrustError::Storage(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| TrustError::Storage(format!("rename {}: {e}", tmp.display())))
    }

    fn lock(&self) -> Result<MutexGuard<'_, TrustState>, TrustError> {
        self.inner
            .lock()
            .map_err(|_| TrustError::Storage("trust state lock poisoned".to_string()))
    }

    fn read<T>(&self, f: impl FnOnce(&TrustState) -> T) -> Result<T, TrustError> {
        Ok(f(&*self.lock()?))
    }

    /// Stage `f` on a copy of the state, persist, then commit.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut TrustState) -> Result<T, TrustError>,
    ) -> Result<T, TrustError> {
        let mut guard = self.lock()?;
        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        self.persist(&staged)?;
        *guard = staged;
        Ok(out)
    }
}

impl TrustStore for FileTrustStore {
    fn upsert_account(&self, account: Account) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.accounts.insert(account.id.clone(), account);
            Ok(())
        })
    }

    fn find_account(&self, id: &str) -> Result<Option<Account>, TrustError> {
        self.read(|s| s.accounts.get(id).cloned())
    }

    fn mark_email_confirmed(&self, id: &str) -> Result<bool, TrustError> {
        self.mutate(|s| Ok(s.mark_email_confirmed(id)))
    }

    fn record_purchase(
        &self,
        owner_id: &str,
        artifact_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.record_purchase(owner_id, artifact_id, at);
            Ok(())
        })
    }

    fn has_purchase(&self, owner_id: &str, artifact_id: &str) -> Result<bool, TrustError> {
        self.read(|s| s.has_purchase(owner_id, artifact_id))
    }

    fn upsert_artifact(&self, artifact: ArtifactRecord) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.artifacts.insert(artifact.id.clone(), artifact);
            Ok(())
        })
    }

    fn find_artifact(&self, id: &str) -> Result<Option<ArtifactRecord>, TrustError> {
        self.read(|s| s.artifacts.get(id).cloned())
    }

    fn update_certification(
        &self,
        artifact_id: &str,
        level: CertLevel,
        score: f64,
    ) -> Result<(), TrustError> {
        self.mutate(|s| s.update_certification(artifact_id, level, score))
    }

    fn update_quality_score(&self, artifact_id: &str, score: f64) -> Result<(), TrustError> {
        self.mutate(|s| s.update_quality_score(artifact_id, score))
    }

    fn insert_grant(&self, grant: DownloadGrant) -> Result<(), TrustError> {
        self.mutate(|s| s.insert_grant(grant))
    }

    fn grants_for(
        &self,
        owner_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<DownloadGrant>, TrustError> {
        self.read(|s| s.grants_for(owner_id, artifact_id))
    }

    fn consume_grant(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, TrustError> {
        self.mutate(|s| Ok(s.consume_grant(token, now)))
    }

    fn revoke_grant(&self, token: &str) -> Result<bool, TrustError> {
        self.mutate(|s| Ok(s.revoke_grant(token)))
    }

    fn insert_credential(&self, credential: AgentCredential) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.credentials.insert(credential.id.clone(), credential);
            Ok(())
        })
    }

    fn credentials_by_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<AgentCredential>, TrustError> {
        self.read(|s| s.credentials_by_fragment(fragment))
    }

    fn revoke_credential(&self, id: &str, at: DateTime<Utc>) -> Result<bool, TrustError> {
        self.mutate(|s| Ok(s.revoke_credential(id, at)))
    }

    fn touch_credential(&self, id: &str, at: DateTime<Utc>) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.touch_credential(id, at);
            Ok(())
        })
    }

    fn criteria(&self) -> Result<Vec<Criterion>, TrustError> {
        self.read(|s| s.criteria.clone())
    }

    fn upsert_criterion(&self, criterion: Criterion) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.upsert_criterion(criterion);
            Ok(())
        })
    }

    fn load_signals(&self, artifact_id: &str) -> Result<QualitySignals, TrustError> {
        self.read(|s| s.signals.get(artifact_id).cloned().unwrap_or_default())
    }

    fn put_signals(&self, artifact_id: &str, signals: QualitySignals) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.signals.insert(artifact_id.to_string(), signals);
            Ok(())
        })
    }

    fn insert_request(&self, request: CertificationRequest) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.requests.insert(request.id.clone(), request);
            Ok(())
        })
    }

    fn find_request(&self, id: &str) -> Result<Option<CertificationRequest>, TrustError> {
        self.read(|s| s.requests.get(id).cloned())
    }

    fn latest_request(
        &self,
        artifact_id: &str,
        level: CertLevel,
    ) -> Result<Option<CertificationRequest>, TrustError> {
        self.read(|s| s.latest_request(artifact_id, level))
    }

    fn update_request(&self, request: CertificationRequest) -> Result<(), TrustError> {
        self.mutate(|s| {
            s.requests.insert(request.id.clone(), request);
            Ok(())
        })
    }
}
