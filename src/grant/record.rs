//! Download grant record and lifecycle predicate.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// A persisted grant binding a buyer to a downloadable artifact.
///
/// The `token` is the only external-facing identifier; internal record ids
/// never leave the persistence layer. Grants are mutated solely by
/// consumption and revocation, and are never deleted — they age out via
/// expiry or exhaustion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadGrant {
    /// High-entropy opaque token, globally unique.
    pub token: String,

    /// The buyer this grant is scoped to.
    pub owner_id: String,

    /// The artifact this grant is scoped to.
    pub artifact_id: String,

    /// When the grant was created.
    pub created_at: DateTime<Utc>,

    /// When the grant stops being redeemable.
    pub expires_at: DateTime<Utc>,

    /// Maximum number of redemptions.
    pub max_uses: u32,

    /// Redemptions so far. Always `<= max_uses`.
    pub use_count: u32,

    /// Whether the grant was administratively revoked.
    pub revoked: bool,
}

impl DownloadGrant {
    /// The "active" predicate: not revoked, not expired, not exhausted.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at && self.use_count < self.max_uses
    }
}

/// What the issuance endpoint returns: the plaintext token (retrievable in
/// full only at this moment) and its expiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantTicket {
    /// The plaintext grant token.
    pub token: String,

    /// Absolute expiry of the grant.
    pub expires_at: DateTime<Utc>,
}

/// Result of an atomic conditional consume at the persistence layer.
///
/// The non-`Consumed` variants are deliberately discriminated here so the
/// calling layer can apply the folding policy itself instead of losing the
/// distinction early.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    /// The grant was redeemed; `use_count` in the returned copy reflects
    /// the increment.
    Consumed(DownloadGrant),
    /// No grant exists for this token.
    NotFound,
    /// The grant was administratively revoked.
    Revoked,
    /// The grant's validity window has passed.
    Expired,
    /// Every permitted use is spent.
    Exhausted,
}

/// Generate a fresh grant token: 32 random bytes (256 bits), base64url.
pub fn new_grant_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
