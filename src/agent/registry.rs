//! Agent credential registry: generation, authentication, authorization.

use crate::agent::key::{
    hash_key, new_plaintext_key, prefix_fragment, verify_key, Permission, Role, KEY_PREFIX,
    PREFIX_FRAGMENT_LEN,
};
use crate::clock::Clock;
use crate::store::TrustStore;
use crate::TrustError;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A persisted agent credential. The plaintext key is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCredential {
    /// Stable credential id.
    pub id: String,

    /// The creator account this key acts on behalf of.
    pub owner_id: String,

    /// Short, non-secret, indexable fragment of the plaintext key.
    pub prefix: String,

    /// Argon2id hash of the full plaintext key.
    pub secret_hash: String,

    /// Capabilities granted to this credential.
    pub permissions: BTreeSet<Permission>,

    /// When the credential was created.
    pub created_at: DateTime<Utc>,

    /// When the credential was revoked, if ever.
    pub revoked_at: Option<DateTime<Utc>>,

    /// Last successful authentication, if any.
    pub last_used_at: Option<DateTime<Utc>>,
}

/// The scoped result of a successful authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentIdentity {
    /// The matched credential.
    pub credential_id: String,

    /// The owning account.
    pub owner_id: String,

    /// The owner's role. `Admin` bypasses capability checks.
    pub role: Role,

    /// Capabilities on the matched credential.
    pub permissions: BTreeSet<Permission>,
}

/// Registry for non-interactive caller credentials.
pub struct AgentKeyRegistry {
    store: Arc<dyn TrustStore>,
    clock: Arc<dyn Clock>,
}

impl AgentKeyRegistry {
    /// Create the registry.
    pub fn new(store: Arc<dyn TrustStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Generate a credential for `owner_id` with the given capabilities.
    ///
    /// Returns the plaintext key and the persisted record. The plaintext is
    /// retrievable exactly here and never again.
    ///
    /// # Errors
    /// Propagates persistence failures as [`TrustError::Storage`].
    pub fn generate(
        &self,
        owner_id: &str,
        permissions: BTreeSet<Permission>,
    ) -> Result<(String, AgentCredential), TrustError> {
        let plaintext = new_plaintext_key();
        let mut id_bytes = [0u8; 8];
        rand::rngs::OsRng.fill_bytes(&mut id_bytes);

        let credential = AgentCredential {
            id: hex::encode(id_bytes),
            owner_id: owner_id.to_string(),
            prefix: prefix_fragment(&plaintext),
            secret_hash: hash_key(&plaintext)?,
            permissions,
            created_at: self.clock.now_utc(),
            revoked_at: None,
            last_used_at: None,
        };
        self.store.insert_credential(credential.clone())?;
        tracing::info!(owner_id, credential_id = %credential.id, "agent key generated");
        Ok((plaintext, credential))
    }

    /// Authenticate a candidate bearer key.
    ///
    /// The fixed-prefix check runs before any persistence access: arbitrary
    /// scanning traffic is rejected without touching the store or the slow
    /// hash path.
    ///
    /// # Errors
    /// - [`TrustError::AuthenticationFailed`] — wrong prefix, unknown key,
    ///   revoked credential, or missing owner account, all folded into one
    ///   category.
    /// - [`TrustError::Storage`] — persistence failure.
    pub fn authenticate(&self, candidate: &str) -> Result<AgentIdentity, TrustError> {
        if !candidate.starts_with(KEY_PREFIX) || candidate.len() < PREFIX_FRAGMENT_LEN {
            tracing::debug!("agent authentication rejected: structural check");
            return Err(TrustError::AuthenticationFailed);
        }

        let fragment = prefix_fragment(candidate);
        let candidates = self.store.credentials_by_fragment(&fragment)?;

        for credential in candidates {
            if !verify_key(candidate, &credential.secret_hash) {
                continue;
            }
            let Some(account) = self.store.find_account(&credential.owner_id)? else {
                tracing::warn!(
                    credential_id = %credential.id,
                    "agent credential has no owner account"
                );
                return Err(TrustError::AuthenticationFailed);
            };
            self.store
                .touch_credential(&credential.id, self.clock.now_utc())?;
            return Ok(AgentIdentity {
                credential_id: credential.id,
                owner_id: credential.owner_id,
                role: account.role,
                permissions: credential.permissions,
            });
        }

        tracing::debug!("agent authentication rejected: no matching credential");
        Err(TrustError::AuthenticationFailed)
    }

    /// Check that an authenticated identity holds a capability.
    ///
    /// # Errors
    /// Returns [`TrustError::PermissionDenied`] when the capability is
    /// absent. Admin accounts bypass the check entirely.
    pub fn authorize(
        &self,
        identity: &AgentIdentity,
        permission: Permission,
    ) -> Result<(), TrustError> {
        if identity.role == Role::Admin {
            return Ok(());
        }
        if identity.permissions.contains(&permission) {
            return Ok(());
        }
        Err(TrustError::PermissionDenied {
            permission: permission.to_string(),
        })
    }

    /// Revoke a credential by id. Returns `false` if the id is unknown.
    ///
    /// # Errors
    /// Propagates persistence failures as [`TrustError::Storage`].
    pub fn revoke(&self, credential_id: &str) -> Result<bool, TrustError> {
        let revoked = self
            .store
            .revoke_credential(credential_id, self.clock.now_utc())?;
        if revoked {
            tracing::warn!(credential_id, "agent key revoked");
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::store::{Account, MemoryTrustStore};

    fn setup() -> (AgentKeyRegistry, Arc<MemoryTrustStore>) {
        let store = Arc::new(MemoryTrustStore::new());
        store
            .upsert_account(Account {
                id: "creator-1".to_string(),
                role: Role::Creator,
                email: "creator@example.com".to_string(),
                email_confirmed: true,
            })
            .unwrap();
        store
            .upsert_account(Account {
                id: "admin-1".to_string(),
                role: Role::Admin,
                email: "admin@example.com".to_string(),
                email_confirmed: true,
            })
            .unwrap();
        let clock = Arc::new(MockClock::from_rfc3339("2025-06-01T12:00:00Z"));
        (AgentKeyRegistry::new(store.clone(), clock), store)
    }

    fn download_only() -> BTreeSet<Permission> {
        [Permission::Download].into_iter().collect()
    }

    #[test]
    fn generate_then_authenticate() {
        let (registry, _store) = setup();
        let (plaintext, record) = registry.generate("creator-1", download_only()).unwrap();

        let identity = registry.authenticate(&plaintext).unwrap();
        assert_eq!(identity.credential_id, record.id);
        assert_eq!(identity.owner_id, "creator-1");
        assert_eq!(identity.role, Role::Creator);
        assert_eq!(identity.permissions, download_only());
    }

    #[test]
    fn wrong_prefix_rejected_without_lookup() {
        let (registry, _store) = setup();
        registry.generate("creator-1", download_only()).unwrap();
        assert!(matches!(
            registry.authenticate("sk_live_notouragentkey"),
            Err(TrustError::AuthenticationFailed)
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let (registry, _store) = setup();
        registry.generate("creator-1", download_only()).unwrap();
        assert!(matches!(
            registry.authenticate(&crate::agent::key::new_plaintext_key()),
            Err(TrustError::AuthenticationFailed)
        ));
    }

    #[test]
    fn revoked_key_rejected() {
        let (registry, _store) = setup();
        let (plaintext, record) = registry.generate("creator-1", download_only()).unwrap();
        assert!(registry.revoke(&record.id).unwrap());
        assert!(matches!(
            registry.authenticate(&plaintext),
            Err(TrustError::AuthenticationFailed)
        ));
    }

    #[test]
    fn missing_owner_account_rejected() {
        let (registry, _store) = setup();
        let (plaintext, _) = registry.generate("ghost-account", download_only()).unwrap();
        assert!(matches!(
            registry.authenticate(&plaintext),
            Err(TrustError::AuthenticationFailed)
        ));
    }

    #[test]
    fn authorize_checks_capability() {
        let (registry, _store) = setup();
        let (plaintext, _) = registry.generate("creator-1", download_only()).unwrap();
        let identity = registry.authenticate(&plaintext).unwrap();

        assert!(registry.authorize(&identity, Permission::Download).is_ok());
        assert!(matches!(
            registry.authorize(&identity, Permission::Certify),
            Err(TrustError::PermissionDenied { permission }) if permission == "certify"
        ));
    }

    #[test]
    fn admin_bypasses_capability_check() {
        let (registry, _store) = setup();
        let (plaintext, _) = registry.generate("admin-1", BTreeSet::new()).unwrap();
        let identity = registry.authenticate(&plaintext).unwrap();
        assert!(registry.authorize(&identity, Permission::Certify).is_ok());
        assert!(registry.authorize(&identity, Permission::Download).is_ok());
    }

    #[test]
    fn successful_authentication_touches_last_used() {
        let (registry, store) = setup();
        let (plaintext, record) = registry.generate("creator-1", download_only()).unwrap();
        assert!(record.last_used_at.is_none());

        registry.authenticate(&plaintext).unwrap();
        let stored = store
            .credentials_by_fragment(&record.prefix)
            .unwrap()
            .into_iter()
            .find(|c| c.id == record.id)
            .unwrap();
        assert!(stored.last_used_at.is_some());
    }
}
