//! Grant issuance and redemption service.
//!
//! Redemption is the security-critical path: the use-count increment and the
//! exhaustion check execute as one atomic conditional update at the store
//! boundary, so two racing redemptions of a grant with one use left produce
//! exactly one success.

use crate::clock::Clock;
use crate::config::TrustConfig;
use crate::grant::record::{new_grant_token, ConsumeOutcome, DownloadGrant, GrantTicket};
use crate::store::TrustStore;
use crate::TrustError;
use std::sync::Arc;
use std::time::Duration;

/// Issues, looks up, redeems, and revokes download grants.
///
/// Purchase verification is the calling layer's responsibility; this service
/// assumes the `(owner, artifact)` pair has already been authorized.
pub struct DownloadGrants {
    store: Arc<dyn TrustStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_uses: u32,
}

impl DownloadGrants {
    /// Create the service from config defaults.
    pub fn new(store: Arc<dyn TrustStore>, clock: Arc<dyn Clock>, config: &TrustConfig) -> Self {
        Self {
            store,
            clock,
            ttl: config.grant_ttl,
            max_uses: config.grant_max_uses,
        }
    }

    /// Issue a new grant for `(owner, artifact)`.
    ///
    /// The returned ticket is the only time the plaintext token is
    /// retrievable in full. Older active grants are left in place.
    ///
    /// # Errors
    /// Propagates persistence failures as [`TrustError::Storage`].
    pub fn issue(&self, owner_id: &str, artifact_id: &str) -> Result<GrantTicket, TrustError> {
        let now = self.clock.now_utc();
        let grant = DownloadGrant {
            token: new_grant_token(),
            owner_id: owner_id.to_string(),
            artifact_id: artifact_id.to_string(),
            created_at: now,
            expires_at: now
                + chrono::Duration::milliseconds(self.ttl.as_millis().min(i64::MAX as u128) as i64),
            max_uses: self.max_uses,
            use_count: 0,
            revoked: false,
        };
        let ticket = GrantTicket {
            token: grant.token.clone(),
            expires_at: grant.expires_at,
        };
        self.store.insert_grant(grant)?;
        tracing::info!(owner_id, artifact_id, "download grant issued");
        Ok(ticket)
    }

    /// Find the most recently created active grant for `(owner, artifact)`.
    ///
    /// Several active grants may coexist; exactly one is returned.
    ///
    /// # Errors
    /// Propagates persistence failures as [`TrustError::Storage`].
    pub fn find_active(
        &self,
        owner_id: &str,
        artifact_id: &str,
    ) -> Result<Option<GrantTicket>, TrustError> {
        let now = self.clock.now_utc();
        let newest = self
            .store
            .grants_for(owner_id, artifact_id)?
            .into_iter()
            .filter(|g| g.is_active(now))
            .max_by_key(|g| g.created_at);
        Ok(newest.map(|g| GrantTicket {
            token: g.token,
            expires_at: g.expires_at,
        }))
    }

    /// Redeem a grant token, consuming one use.
    ///
    /// # Errors
    /// - [`TrustError::InvalidToken`] — unknown, revoked, or expired token.
    ///   The three causes are folded so internal grant state cannot be
    ///   probed; the real cause is logged at `debug`.
    /// - [`TrustError::GrantExhausted`] — the grant exists but its uses are
    ///   spent.
    /// - [`TrustError::Storage`] — persistence failure.
    pub fn redeem(&self, token: &str) -> Result<DownloadGrant, TrustError> {
        match self.store.consume_grant(token, self.clock.now_utc())? {
            ConsumeOutcome::Consumed(grant) => {
                tracing::info!(
                    owner_id = %grant.owner_id,
                    artifact_id = %grant.artifact_id,
                    use_count = grant.use_count,
                    "download grant redeemed"
                );
                Ok(grant)
            }
            ConsumeOutcome::Exhausted => Err(TrustError::GrantExhausted),
            ConsumeOutcome::NotFound => {
                tracing::debug!("grant redemption rejected: unknown token");
                Err(TrustError::InvalidToken)
            }
            ConsumeOutcome::Revoked => {
                tracing::debug!("grant redemption rejected: revoked");
                Err(TrustError::InvalidToken)
            }
            ConsumeOutcome::Expired => {
                tracing::debug!("grant redemption rejected: expired");
                Err(TrustError::InvalidToken)
            }
        }
    }

    /// Administratively revoke a grant. Returns `false` if the token is
    /// unknown.
    ///
    /// # Errors
    /// Propagates persistence failures as [`TrustError::Storage`].
    pub fn revoke(&self, token: &str) -> Result<bool, TrustError> {
        let revoked = self.store.revoke_grant(token)?;
        if revoked {
            tracing::warn!("download grant revoked");
        }
        Ok(revoked)
    }
}
