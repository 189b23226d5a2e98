//! Skillgate error types.
//!
//! The taxonomy separates what a caller may see from what actually went
//! wrong. Credential failures fold into one opaque variant per credential
//! type so that callers cannot probe internal state; authorization failures
//! stay distinct because insufficient capability is not a secret. Storage
//! failures are always the generic [`TrustError::Storage`] with detail kept
//! in server-side logs.

use thiserror::Error;

/// Errors that can occur in the trust and certification core.
#[derive(Debug, Error)]
pub enum TrustError {
    /// Configuration is invalid. Raised at startup, never per-call.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Identity or download token is malformed, tampered, unknown, revoked,
    /// or expired. One opaque category covers all of these.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Download grant exists but its uses are spent.
    ///
    /// Distinct from [`TrustError::InvalidToken`] because "request a new
    /// grant" is an actionable remedy; the wire layer still folds both into
    /// one external code.
    #[error("Download grant exhausted")]
    GrantExhausted,

    /// Agent credential is malformed, unknown, or revoked. Folded into one
    /// category to prevent enumeration.
    #[error("Agent authentication failed")]
    AuthenticationFailed,

    /// Credential is valid but lacks the required capability.
    #[error("Permission denied: {permission} capability required")]
    PermissionDenied {
        /// The capability that was required but not granted.
        permission: String,
    },

    /// No purchase record exists for the requested artifact.
    #[error("No purchase record for artifact {artifact_id}")]
    PurchaseRequired {
        /// The artifact the caller tried to access.
        artifact_id: String,
    },

    /// Artifact record or its stored file location is missing.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Certification request does not exist.
    #[error("Certification request not found: {0}")]
    RequestNotFound(String),

    /// Certification request is already in a terminal state.
    #[error("Certification request already reviewed")]
    RequestAlreadyReviewed,

    /// Persistence-layer failure. Detail is logged server-side, never
    /// surfaced to the caller beyond this generic category.
    #[error("Storage error: {0}")]
    Storage(String),
}
