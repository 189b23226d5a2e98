//! Error bodies, headers, and redirect discriminators.

use crate::store::ArtifactRecord;
use crate::TrustError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type served for artifact downloads.
pub const DOWNLOAD_CONTENT_TYPE: &str = "application/zip";

/// Downloads carry consumable grants, so responses must never be cached.
pub const DOWNLOAD_CACHE_CONTROL: &str = "no-store";

/// Machine-readable failure codes for the download endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadErrorCode {
    /// No token was supplied at all.
    MissingToken,

    /// The token is unknown, expired, revoked, or exhausted. One code for
    /// all of these, so responses do not reveal which grants exist.
    InvalidToken,

    /// The grant was valid but the artifact bytes are gone.
    FileNotFound,

    /// Storage or configuration failure.
    InternalError,
}

impl DownloadErrorCode {
    /// The HTTP status a front end should pair with this code.
    pub fn http_status(self) -> u16 {
        match self {
            Self::MissingToken => 400,
            Self::InvalidToken | Self::FileNotFound => 404,
            Self::InternalError => 500,
        }
    }
}

/// JSON failure body for the download endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadFailure {
    /// Always `false`.
    pub success: bool,

    /// Machine-readable code.
    pub error: DownloadErrorCode,

    /// Human-readable explanation.
    pub message: String,
}

impl DownloadFailure {
    /// Build the failure body for a redemption error.
    pub fn from_error(err: &TrustError) -> Self {
        let error = match err {
            TrustError::InvalidToken
            | TrustError::GrantExhausted
            | TrustError::AuthenticationFailed
            | TrustError::PermissionDenied { .. } => DownloadErrorCode::InvalidToken,
            TrustError::ArtifactNotFound(_) => DownloadErrorCode::FileNotFound,
            _ => DownloadErrorCode::InternalError,
        };
        Self {
            success: false,
            error,
            message: err.to_string(),
        }
    }

    /// The failure body for a request that carried no token.
    pub fn missing_token() -> Self {
        Self {
            success: false,
            error: DownloadErrorCode::MissingToken,
            message: "download token is required".to_string(),
        }
    }
}

/// Response headers for a successful download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadHeaders {
    /// `Content-Type` value.
    pub content_type: &'static str,

    /// `Cache-Control` value.
    pub cache_control: &'static str,

    /// `Content-Disposition` value.
    pub content_disposition: String,
}

impl DownloadHeaders {
    /// Headers for serving `artifact` as an attachment.
    pub fn for_artifact(artifact: &ArtifactRecord) -> Self {
        Self {
            content_type: DOWNLOAD_CONTENT_TYPE,
            cache_control: DOWNLOAD_CACHE_CONTROL,
            content_disposition: format!(
                "attachment; filename=\"{}-{}.zip\"",
                artifact.slug, artifact.version
            ),
        }
    }
}

/// Outcome discriminator appended to the email-confirmation redirect.
/// Informational only; the landing page decides what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmRedirect {
    /// Confirmation succeeded.
    Confirmed,

    /// No token in the confirmation link.
    MissingToken,

    /// Token failed verification or expired.
    InvalidToken,

    /// Storage failure while confirming.
    Server,
}

impl ConfirmRedirect {
    /// Classify a confirmation result.
    pub fn from_result(result: &Result<(), TrustError>) -> Self {
        match result {
            Ok(()) => Self::Confirmed,
            Err(TrustError::InvalidToken) => Self::InvalidToken,
            Err(_) => Self::Server,
        }
    }
}

impl fmt::Display for ConfirmRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Confirmed => "confirmed",
            Self::MissingToken => "missing-token",
            Self::InvalidToken => "invalid-token",
            Self::Server => "server",
        };
        f.write_str(tag)
    }
}
