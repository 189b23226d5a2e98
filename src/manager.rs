//! High-level facade wiring the trust components together.

use crate::agent::key::Permission;
use crate::agent::registry::{AgentCredential, AgentIdentity, AgentKeyRegistry};
use crate::cert::criteria::Criterion;
use crate::cert::engine::{CertificationEngine, CertificationStatus};
use crate::cert::level::CertLevel;
use crate::cert::request::CertificationRequest;
use crate::cert::signals::QualitySignals;
use crate::clock::{Clock, SystemClock};
use crate::config::TrustConfig;
use crate::grant::record::GrantTicket;
use crate::grant::redeem::DownloadGrants;
use crate::protocol::models::DownloadHeaders;
use crate::store::TrustStore;
use crate::token::codec::TokenCodec;
use crate::TrustError;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Everything a front end needs to serve one redeemed download.
#[derive(Debug, Clone, PartialEq)]
pub struct RedeemedDownload {
    /// The artifact being served.
    pub artifact_id: String,

    /// Where the artifact bytes live.
    pub storage_url: String,

    /// Display title.
    pub title: String,

    /// URL-safe short name.
    pub slug: String,

    /// Published version.
    pub version: String,

    /// Uses left on the grant after this redemption.
    pub remaining_uses: u32,

    /// Response headers for serving the file.
    pub headers: DownloadHeaders,
}

/// The single entry point: owns configuration, clock, store, and the four
/// trust components. Front ends hold one of these and call through it.
pub struct TrustManager {
    config: TrustConfig,
    store: Arc<dyn TrustStore>,
    tokens: TokenCodec,
    grants: DownloadGrants,
    agents: AgentKeyRegistry,
    certification: CertificationEngine,
    clock: Arc<dyn Clock>,
}

impl TrustManager {
    /// Build a manager over the given store, on the system clock.
    ///
    /// # Errors
    /// Returns [`TrustError::ConfigError`] when the configuration fails
    /// validation (short secret, zero TTLs, zero max uses).
    pub fn new(config: TrustConfig, store: Arc<dyn TrustStore>) -> Result<Self, TrustError> {
        Self::build(config, store, Arc::new(SystemClock))
    }

    /// Build a manager on an injected clock.
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(
        config: TrustConfig,
        store: Arc<dyn TrustStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TrustError> {
        Self::build(config, store, clock)
    }

    fn build(
        config: TrustConfig,
        store: Arc<dyn TrustStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TrustError> {
        config.validate()?;
        let tokens = TokenCodec::new(&config.token_secret)?;
        let grants = DownloadGrants::new(Arc::clone(&store), Arc::clone(&clock), &config);
        let agents = AgentKeyRegistry::new(Arc::clone(&store), Arc::clone(&clock));
        let certification = CertificationEngine::new(Arc::clone(&store), Arc::clone(&clock));
        Ok(Self {
            config,
            store,
            tokens,
            grants,
            agents,
            certification,
            clock,
        })
    }

    /// The validated configuration this manager runs on.
    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    // --- identity tokens ---

    /// Issue a signed identity token for an account (e.g. for an email
    /// confirmation link). Stateless; nothing is persisted.
    pub fn issue_identity_token(&self, account_id: &str) -> String {
        self.tokens
            .issue(account_id, self.config.token_ttl, self.clock.as_ref())
    }

    /// Verify an identity token and mark its account's email confirmed.
    ///
    /// An unknown subject reports the same [`TrustError::InvalidToken`] as a
    /// bad signature, so the endpoint cannot be used to probe account ids.
    pub fn confirm_email(&self, token: &str) -> Result<(), TrustError> {
        let account_id = self.tokens.verify(token, self.clock.as_ref())?;
        if self.store.mark_email_confirmed(&account_id)? {
            tracing::info!(account_id = %account_id, "email confirmed");
            Ok(())
        } else {
            tracing::debug!(account_id = %account_id, "confirmation token for unknown account");
            Err(TrustError::InvalidToken)
        }
    }

    // --- download grants ---

    /// Issue a download grant for a purchased artifact.
    ///
    /// # Errors
    /// - [`TrustError::PurchaseRequired`] — no purchase record.
    /// - [`TrustError::ArtifactNotFound`] — unknown artifact.
    pub fn issue_download_grant(
        &self,
        owner_id: &str,
        artifact_id: &str,
    ) -> Result<GrantTicket, TrustError> {
        if self.store.find_artifact(artifact_id)?.is_none() {
            return Err(TrustError::ArtifactNotFound(artifact_id.to_string()));
        }
        if !self.store.has_purchase(owner_id, artifact_id)? {
            return Err(TrustError::PurchaseRequired {
                artifact_id: artifact_id.to_string(),
            });
        }
        self.grants.issue(owner_id, artifact_id)
    }

    /// The newest still-active grant for `(owner, artifact)`, if any.
    pub fn active_download_grant(
        &self,
        owner_id: &str,
        artifact_id: &str,
    ) -> Result<Option<GrantTicket>, TrustError> {
        self.grants.find_active(owner_id, artifact_id)
    }

    /// Redeem a grant token and resolve the artifact it unlocks.
    ///
    /// # Errors
    /// - [`TrustError::InvalidToken`] / [`TrustError::GrantExhausted`] — see
    ///   [`DownloadGrants::redeem`].
    /// - [`TrustError::ArtifactNotFound`] — the grant is valid but the
    ///   artifact row or its stored file location is gone.
    pub fn redeem_download(&self, token: &str) -> Result<RedeemedDownload, TrustError> {
        let grant = self.grants.redeem(token)?;
        let artifact = self
            .store
            .find_artifact(&grant.artifact_id)?
            .ok_or_else(|| TrustError::ArtifactNotFound(grant.artifact_id.clone()))?;
        let storage_url = artifact
            .storage_url
            .clone()
            .ok_or_else(|| TrustError::ArtifactNotFound(grant.artifact_id.clone()))?;
        Ok(RedeemedDownload {
            artifact_id: artifact.id.clone(),
            storage_url,
            title: artifact.title.clone(),
            slug: artifact.slug.clone(),
            version: artifact.version.clone(),
            remaining_uses: grant.max_uses.saturating_sub(grant.use_count),
            headers: DownloadHeaders::for_artifact(&artifact),
        })
    }

    /// Revoke a grant token. Returns `false` if the token is unknown.
    pub fn revoke_download_grant(&self, token: &str) -> Result<bool, TrustError> {
        self.grants.revoke(token)
    }

    // --- agent keys ---

    /// Generate an agent key for an account. Returns the plaintext key
    /// (shown once) and the stored credential row.
    pub fn create_agent_key(
        &self,
        owner_id: &str,
        permissions: BTreeSet<Permission>,
    ) -> Result<(String, AgentCredential), TrustError> {
        self.agents.generate(owner_id, permissions)
    }

    /// Authenticate a bearer key and resolve its identity.
    pub fn authenticate_agent(&self, key: &str) -> Result<AgentIdentity, TrustError> {
        self.agents.authenticate(key)
    }

    /// Revoke an agent credential by id.
    pub fn revoke_agent_key(&self, credential_id: &str) -> Result<bool, TrustError> {
        self.agents.revoke(credential_id)
    }

    /// Redeem a download on behalf of an agent. Authentication runs first;
    /// the capability check runs second, so a valid key without the
    /// `download` capability sees an authorization error.
    pub fn agent_redeem_download(
        &self,
        key: &str,
        token: &str,
    ) -> Result<RedeemedDownload, TrustError> {
        let identity = self.agents.authenticate(key)?;
        self.agents.authorize(&identity, Permission::Download)?;
        self.redeem_download(token)
    }

    /// Evaluate an artifact's certification on behalf of an agent.
    /// Requires the `certify` capability.
    pub fn agent_certify(
        &self,
        key: &str,
        artifact_id: &str,
    ) -> Result<CertificationStatus, TrustError> {
        let identity = self.agents.authenticate(key)?;
        self.agents.authorize(&identity, Permission::Certify)?;
        self.certification.evaluate(artifact_id)
    }

    // --- certification ---

    /// Replace the recorded quality signals for an artifact.
    pub fn record_quality_signals(
        &self,
        artifact_id: &str,
        signals: QualitySignals,
    ) -> Result<(), TrustError> {
        if self.store.find_artifact(artifact_id)?.is_none() {
            return Err(TrustError::ArtifactNotFound(artifact_id.to_string()));
        }
        self.store.put_signals(artifact_id, signals)
    }

    /// Evaluate an artifact against its next unachieved level.
    pub fn evaluate_certification(
        &self,
        artifact_id: &str,
    ) -> Result<CertificationStatus, TrustError> {
        self.certification.evaluate(artifact_id)
    }

    /// Promote an artifact through every level it now fully satisfies.
    /// Returns the level it holds afterwards.
    pub fn promote_certification(&self, artifact_id: &str) -> Result<CertLevel, TrustError> {
        self.certification.promote(artifact_id)
    }

    /// The criteria configuration, grouped by level for display.
    pub fn criteria_catalog(&self) -> Result<Vec<(CertLevel, Vec<Criterion>)>, TrustError> {
        self.certification.criteria_catalog()
    }

    /// File a manual review request for an artifact at a target level.
    pub fn request_certification_review(
        &self,
        artifact_id: &str,
        requested_by: &str,
        target_level: CertLevel,
    ) -> Result<CertificationRequest, TrustError> {
        self.certification
            .request_review(artifact_id, requested_by, target_level)
    }

    /// Decide a pending review request. Approval triggers a promotion pass.
    pub fn review_certification(
        &self,
        request_id: &str,
        reviewer: &str,
        approve: bool,
    ) -> Result<CertificationRequest, TrustError> {
        self.certification.review(request_id, reviewer, approve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::key::Role;
    use crate::clock::MockClock;
    use crate::store::{Account, ArtifactRecord, MemoryTrustStore};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn seeded_store() -> Arc<MemoryTrustStore> {
        let store = Arc::new(MemoryTrustStore::new());
        store
            .upsert_account(Account {
                id: "buyer-1".to_string(),
                role: Role::Buyer,
                email: "buyer@example.com".to_string(),
                email_confirmed: false,
            })
            .unwrap();
        store
            .upsert_artifact(ArtifactRecord {
                id: "art-1".to_string(),
                slug: "csv-wrangler".to_string(),
                title: "CSV Wrangler".to_string(),
                version: "1.0.0".to_string(),
                creator_id: "creator-1".to_string(),
                storage_url: Some("s3://bucket/csv-wrangler.zip".to_string()),
                cert_level: CertLevel::None,
                quality_score: 0.0,
            })
            .unwrap();
        store
    }

    fn manager(store: Arc<MemoryTrustStore>, clock: Arc<MockClock>) -> TrustManager {
        TrustManager::new_with_clock(TrustConfig::new(SECRET), store, clock).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let result = TrustManager::new(
            TrustConfig::new("short"),
            Arc::new(MemoryTrustStore::new()),
        );
        assert!(matches!(result, Err(TrustError::ConfigError(_))));
    }

    #[test]
    fn confirm_email_round_trip() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(Arc::clone(&store), clock);

        let token = mgr.issue_identity_token("buyer-1");
        mgr.confirm_email(&token).unwrap();
        assert!(store.find_account("buyer-1").unwrap().unwrap().email_confirmed);
    }

    #[test]
    fn confirm_email_for_unknown_account_reads_as_invalid_token() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(store, clock);

        let token = mgr.issue_identity_token("nobody");
        assert!(matches!(
            mgr.confirm_email(&token),
            Err(TrustError::InvalidToken)
        ));
    }

    #[test]
    fn grant_requires_purchase_record() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(Arc::clone(&store), Arc::clone(&clock));

        assert!(matches!(
            mgr.issue_download_grant("buyer-1", "art-1"),
            Err(TrustError::PurchaseRequired { .. })
        ));

        store
            .record_purchase("buyer-1", "art-1", clock.now_utc())
            .unwrap();
        let ticket = mgr.issue_download_grant("buyer-1", "art-1").unwrap();
        assert!(!ticket.token.is_empty());
    }

    #[test]
    fn grant_for_unknown_artifact_is_not_found() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(store, clock);
        assert!(matches!(
            mgr.issue_download_grant("buyer-1", "art-404"),
            Err(TrustError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn redeem_resolves_location_metadata_and_headers() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(Arc::clone(&store), Arc::clone(&clock));
        store
            .record_purchase("buyer-1", "art-1", clock.now_utc())
            .unwrap();

        let ticket = mgr.issue_download_grant("buyer-1", "art-1").unwrap();
        let redeemed = mgr.redeem_download(&ticket.token).unwrap();
        assert_eq!(redeemed.storage_url, "s3://bucket/csv-wrangler.zip");
        assert_eq!(redeemed.remaining_uses, 2);
        assert_eq!(
            redeemed.headers.content_disposition,
            "attachment; filename=\"csv-wrangler-1.0.0.zip\""
        );
    }

    #[test]
    fn redeem_without_stored_file_is_artifact_not_found() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(Arc::clone(&store), Arc::clone(&clock));
        store
            .record_purchase("buyer-1", "art-1", clock.now_utc())
            .unwrap();
        let mut artifact = store.find_artifact("art-1").unwrap().unwrap();
        artifact.storage_url = None;
        store.upsert_artifact(artifact).unwrap();

        let ticket = mgr.issue_download_grant("buyer-1", "art-1").unwrap();
        assert!(matches!(
            mgr.redeem_download(&ticket.token),
            Err(TrustError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn agent_capability_checks_run_after_authentication() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(Arc::clone(&store), Arc::clone(&clock));

        let (key, _) = mgr
            .create_agent_key("buyer-1", [Permission::Download].into_iter().collect())
            .unwrap();

        // Valid key, missing capability: authorization error, not
        // authentication.
        assert!(matches!(
            mgr.agent_certify(&key, "art-1"),
            Err(TrustError::PermissionDenied { permission }) if permission == "certify"
        ));

        // Garbage key: authentication error.
        assert!(matches!(
            mgr.agent_certify("agent_bogus", "art-1"),
            Err(TrustError::AuthenticationFailed)
        ));
    }

    #[test]
    fn revoked_grant_stops_redeeming() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(Arc::clone(&store), Arc::clone(&clock));
        store
            .record_purchase("buyer-1", "art-1", clock.now_utc())
            .unwrap();

        let ticket = mgr.issue_download_grant("buyer-1", "art-1").unwrap();
        assert!(mgr.revoke_download_grant(&ticket.token).unwrap());
        assert!(matches!(
            mgr.redeem_download(&ticket.token),
            Err(TrustError::InvalidToken)
        ));
    }

    #[test]
    fn signals_require_an_existing_artifact() {
        let store = seeded_store();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        let mgr = manager(store, clock);
        assert!(matches!(
            mgr.record_quality_signals("art-404", QualitySignals::default()),
            Err(TrustError::ArtifactNotFound(_))
        ));
    }
}
