//! Persistence boundary.
//!
//! Relational storage of marketplace records is an external concern; this
//! crate sees it as the [`TrustStore`] trait: simple read/write/query
//! operations over explicitly typed rows. Rows that fail to parse are
//! rejected at this boundary instead of leaking loosely-typed data into
//! business logic.
//!
//! Two backends ship with the crate: an in-memory store (tests, embedding)
//! and a single-document JSON file store with atomic writes (small
//! deployments). Both run the grant consume as one lock-scoped conditional
//! update, which is what makes concurrent redemption linearizable.

pub mod file;
pub mod memory;
mod state;

pub use file::FileTrustStore;
pub use memory::MemoryTrustStore;

use crate::agent::key::Role;
use crate::agent::registry::AgentCredential;
use crate::cert::criteria::Criterion;
use crate::cert::level::CertLevel;
use crate::cert::request::CertificationRequest;
use crate::cert::signals::QualitySignals;
use crate::grant::record::{ConsumeOutcome, DownloadGrant};
use crate::TrustError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A marketplace account, as far as this core needs to know it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable account id.
    pub id: String,

    /// The account's role.
    pub role: Role,

    /// Contact address; confirmed through the identity-token flow.
    pub email: String,

    /// Whether the address has been confirmed.
    pub email_confirmed: bool,
}

/// A purchase record binding a buyer to an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// The buying account.
    pub owner_id: String,

    /// The purchased artifact.
    pub artifact_id: String,

    /// When the purchase completed.
    pub purchased_at: DateTime<Utc>,
}

/// A published skill package, with its certification cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Stable artifact id.
    pub id: String,

    /// URL-safe short name; used in download filenames.
    pub slug: String,

    /// Display title.
    pub title: String,

    /// Published version string.
    pub version: String,

    /// The creator account that published this skill.
    pub creator_id: String,

    /// Where the artifact bytes live, if uploaded.
    pub storage_url: Option<String>,

    /// Achieved certification level (cache, forward-only).
    pub cert_level: CertLevel,

    /// Last computed quality score (display cache).
    pub quality_score: f64,
}

/// The external persistence service, seen as typed read/write/query ops.
///
/// Grant and credential rows are mutated only through their dedicated
/// operations here; no other component writes them.
pub trait TrustStore: Send + Sync {
    // --- accounts ---

    /// Insert or replace an account row.
    fn upsert_account(&self, account: Account) -> Result<(), TrustError>;

    /// Look up an account by id.
    fn find_account(&self, id: &str) -> Result<Option<Account>, TrustError>;

    /// Set `email_confirmed` on an account. Returns `false` if unknown.
    fn mark_email_confirmed(&self, id: &str) -> Result<bool, TrustError>;

    // --- purchases ---

    /// Record a completed purchase.
    fn record_purchase(
        &self,
        owner_id: &str,
        artifact_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), TrustError>;

    /// Whether a purchase record exists for `(owner, artifact)`.
    fn has_purchase(&self, owner_id: &str, artifact_id: &str) -> Result<bool, TrustError>;

    // --- artifacts ---

    /// Insert or replace an artifact row.
    fn upsert_artifact(&self, artifact: ArtifactRecord) -> Result<(), TrustError>;

    /// Look up an artifact by id.
    fn find_artifact(&self, id: &str) -> Result<Option<ArtifactRecord>, TrustError>;

    /// Write the certification cache (level and score) on an artifact.
    /// Only promotion writes the level; see [`TrustStore::update_quality_score`]
    /// for the score-only path.
    fn update_certification(
        &self,
        artifact_id: &str,
        level: CertLevel,
        score: f64,
    ) -> Result<(), TrustError>;

    /// Write the score cache on an artifact, leaving its level untouched.
    fn update_quality_score(&self, artifact_id: &str, score: f64) -> Result<(), TrustError>;

    // --- download grants ---

    /// Persist a new grant. Tokens are globally unique.
    fn insert_grant(&self, grant: DownloadGrant) -> Result<(), TrustError>;

    /// All grants for `(owner, artifact)`, active or not.
    fn grants_for(
        &self,
        owner_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<DownloadGrant>, TrustError>;

    /// Atomic conditional consume: check the active predicate and increment
    /// `use_count` as one linearizable step.
    fn consume_grant(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, TrustError>;

    /// Mark a grant revoked. Returns `false` if the token is unknown.
    fn revoke_grant(&self, token: &str) -> Result<bool, TrustError>;

    // --- agent credentials ---

    /// Persist a new credential.
    fn insert_credential(&self, credential: AgentCredential) -> Result<(), TrustError>;

    /// Non-revoked credentials whose stored prefix matches `fragment`.
    fn credentials_by_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<AgentCredential>, TrustError>;

    /// Mark a credential revoked. Returns `false` if the id is unknown.
    fn revoke_credential(&self, id: &str, at: DateTime<Utc>) -> Result<bool, TrustError>;

    /// Record a successful authentication on a credential.
    fn touch_credential(&self, id: &str, at: DateTime<Utc>) -> Result<(), TrustError>;

    // --- certification ---

    /// The full criteria configuration.
    fn criteria(&self) -> Result<Vec<Criterion>, TrustError>;

    /// Insert or replace a criterion by id.
    fn upsert_criterion(&self, criterion: Criterion) -> Result<(), TrustError>;

    /// The recorded quality signals for an artifact; all-unknown if none.
    fn load_signals(&self, artifact_id: &str) -> Result<QualitySignals, TrustError>;

    /// Replace the recorded signals for an artifact.
    fn put_signals(&self, artifact_id: &str, signals: QualitySignals) -> Result<(), TrustError>;

    /// Persist a new review request.
    fn insert_request(&self, request: CertificationRequest) -> Result<(), TrustError>;

    /// Look up a review request by id.
    fn find_request(&self, id: &str) -> Result<Option<CertificationRequest>, TrustError>;

    /// The most recently requested review for `(artifact, level)`.
    fn latest_request(
        &self,
        artifact_id: &str,
        level: CertLevel,
    ) -> Result<Option<CertificationRequest>, TrustError>;

    /// Replace a review request by id.
    fn update_request(&self, request: CertificationRequest) -> Result<(), TrustError>;
}
