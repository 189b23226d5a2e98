//! HMAC-SHA256 identity token codec.
//!
//! Wire format:
//! ```text
//! base64url(subject + "." + expiryEpochMillis) + "." + hex(HMAC-SHA256(secret, payload))
//! ```
//! The MAC covers the raw payload, before base64 encoding. The outer `.`
//! delimiter never appears in the base64url alphabet, so splitting is
//! unambiguous. Subjects may contain `.` themselves; the expiry is always
//! the final dot-separated field of the decoded payload.

use crate::clock::Clock;
use crate::TrustError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Stateless signer/verifier for short-lived identity tokens.
///
/// Holds only the server secret; tokens carry everything else. Verification
/// folds every failure mode (malformed, tampered, expired) into one opaque
/// [`TrustError::InvalidToken`] so callers cannot learn which check failed.
pub struct TokenCodec {
    /// Pre-keyed MAC template, cloned per operation.
    mac: HmacSha256,
}

impl TokenCodec {
    /// Create a codec from the server secret.
    ///
    /// # Errors
    /// Returns `ConfigError` if the secret is unusable. This is the only
    /// fatal path in the codec; per-token failures never error out.
    pub fn new(secret: &str) -> Result<Self, TrustError> {
        if secret.is_empty() {
            return Err(TrustError::ConfigError(
                "token secret cannot be empty".to_string(),
            ));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| TrustError::ConfigError(format!("Unusable token secret: {}", e)))?;
        Ok(Self { mac })
    }

    /// Issue a signed token for `subject`, valid for `ttl` from now.
    pub fn issue(&self, subject: &str, ttl: Duration, clock: &dyn Clock) -> String {
        let ttl_millis = ttl.as_millis().min(i64::MAX as u128) as i64;
        let expires_at = clock.now_millis().saturating_add(ttl_millis);
        let payload = format!("{}.{}", subject, expires_at);
        let signature = hex::encode(self.sign(payload.as_bytes()));
        format!("{}.{}", URL_SAFE_NO_PAD.encode(&payload), signature)
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    /// Returns [`TrustError::InvalidToken`] for every malformed, tampered,
    /// or expired input. The concrete cause is logged at `debug` level only.
    pub fn verify(&self, token: &str, clock: &dyn Clock) -> Result<String, TrustError> {
        let Some((encoded, signature_hex)) = token.split_once('.') else {
            tracing::debug!("identity token rejected: missing delimiter");
            return Err(TrustError::InvalidToken);
        };

        let Ok(payload) = URL_SAFE_NO_PAD.decode(encoded) else {
            tracing::debug!("identity token rejected: payload not base64url");
            return Err(TrustError::InvalidToken);
        };

        let Ok(supplied) = hex::decode(signature_hex) else {
            tracing::debug!("identity token rejected: signature not hex");
            return Err(TrustError::InvalidToken);
        };

        // Constant-time comparison; length mismatch compares unequal.
        let expected = self.sign(&payload);
        if !bool::from(expected.as_slice().ct_eq(supplied.as_slice())) {
            tracing::debug!("identity token rejected: MAC mismatch");
            return Err(TrustError::InvalidToken);
        }

        let Ok(payload) = String::from_utf8(payload) else {
            tracing::debug!("identity token rejected: payload not UTF-8");
            return Err(TrustError::InvalidToken);
        };

        let Some((subject, expiry_field)) = payload.rsplit_once('.') else {
            tracing::debug!("identity token rejected: payload missing expiry field");
            return Err(TrustError::InvalidToken);
        };

        let Ok(expires_at) = expiry_field.parse::<i64>() else {
            tracing::debug!("identity token rejected: unparsable expiry");
            return Err(TrustError::InvalidToken);
        };

        if clock.now_millis() > expires_at {
            tracing::debug!("identity token rejected: expired");
            return Err(TrustError::InvalidToken);
        }

        Ok(subject.to_string())
    }

    /// Compute the MAC over a raw payload.
    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
