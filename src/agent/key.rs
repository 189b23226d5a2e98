//! Agent key format, hashing, and capability vocabulary.
//!
//! Plaintext key format: `agent_` + base64url(24 random bytes), 192 bits of
//! entropy in a URL-safe alphabet. The stored `prefix` fragment (the literal
//! prefix plus the first few suffix characters) narrows credential lookup
//! before the deliberately expensive Argon2 comparison runs.

use argon2::password_hash::{rand_core::OsRng as HashOsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Fixed public prefix of every agent key. Not a secret.
pub const KEY_PREFIX: &str = "agent_";

/// Length of the indexable prefix fragment persisted alongside the hash.
pub const PREFIX_FRAGMENT_LEN: usize = 14;

/// Capabilities an agent credential may carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Redeem download grants for purchased artifacts.
    Download,
    /// Trigger certification evaluation and promotion.
    Certify,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Download => write!(f, "download"),
            Self::Certify => write!(f, "certify"),
        }
    }
}

/// Marketplace account roles.
///
/// `Admin` bypasses capability checks entirely during authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Marketplace operator.
    Admin,
    /// Publishes skills.
    Creator,
    /// Purchases skills.
    Buyer,
}

/// Generate a fresh plaintext agent key.
pub fn new_plaintext_key() -> String {
    let mut bytes = [0u8; 24];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("{}{}", KEY_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}

/// The indexable, non-secret leading fragment of a plaintext key.
pub fn prefix_fragment(plaintext: &str) -> String {
    plaintext.chars().take(PREFIX_FRAGMENT_LEN).collect()
}

/// Derive the stored hash for a plaintext key (Argon2id, fresh salt).
///
/// # Errors
/// Returns `ConfigError` if the hasher rejects its parameters; this never
/// depends on the key material itself.
pub fn hash_key(plaintext: &str) -> Result<String, crate::TrustError> {
    let salt = SaltString::generate(&mut HashOsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| crate::TrustError::ConfigError(format!("Key hashing failed: {}", e)))
}

/// Check a candidate key against a stored hash.
///
/// Robust to empty, short, or malformed candidates and to corrupted stored
/// hashes: every such case is simply `false`, never a panic.
pub fn verify_key(candidate: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn plaintext_keys_have_prefix_and_entropy() {
        let key = new_plaintext_key();
        assert!(key.starts_with(KEY_PREFIX));
        // agent_ (6) + 24 bytes base64url (32)
        assert_eq!(key.len(), 38);
    }

    #[test]
    fn plaintext_keys_pairwise_distinct() {
        let keys: HashSet<String> = (0..10_000).map(|_| new_plaintext_key()).collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn hashes_pairwise_distinct() {
        // Salted hashing makes even the sample size expensive; a small
        // sample still exercises salt uniqueness.
        let hashes: HashSet<String> = (0..8)
            .map(|_| hash_key(&new_plaintext_key()).unwrap())
            .collect();
        assert_eq!(hashes.len(), 8);
    }

    #[test]
    fn same_key_two_hashes_differ_but_both_verify() {
        let key = new_plaintext_key();
        let h1 = hash_key(&key).unwrap();
        let h2 = hash_key(&key).unwrap();
        assert_ne!(h1, h2);
        assert!(verify_key(&key, &h1));
        assert!(verify_key(&key, &h2));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let hash = hash_key(&new_plaintext_key()).unwrap();
        assert!(!verify_key(&new_plaintext_key(), &hash));
    }

    #[test]
    fn malformed_inputs_never_panic() {
        let hash = hash_key("agent_test").unwrap();
        assert!(!verify_key("", &hash));
        assert!(!verify_key("x", &hash));
        assert!(!verify_key("agent_test", "not-a-phc-string"));
        assert!(!verify_key("agent_test", ""));
    }

    #[test]
    fn fragment_is_stable_and_short() {
        let key = new_plaintext_key();
        let fragment = prefix_fragment(&key);
        assert_eq!(fragment.len(), PREFIX_FRAGMENT_LEN);
        assert!(key.starts_with(&fragment));
    }

    #[test]
    fn permission_display_matches_wire_names() {
        assert_eq!(Permission::Download.to_string(), "download");
        assert_eq!(Permission::Certify.to_string(), "certify");
    }
}
