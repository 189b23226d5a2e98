//! Wire-level shapes for HTTP front ends.
//!
//! The core stays transport-free; this module only fixes the envelope an
//! HTTP layer puts around it, so every front end reports download failures
//! and confirmation redirects the same way.

pub mod models;

pub use models::{DownloadErrorCode, DownloadFailure, DownloadHeaders, ConfirmRedirect};
