//! # Skillgate
//!
//! **Trust and certification core for a skill marketplace.**
//!
//! Skillgate issues and verifies the tokens, grants, and credentials a
//! marketplace hands out, and drives the certification ladder its artifacts
//! climb. It is transport-free: a web layer sits in front of it, storage
//! sits behind the [`store::TrustStore`] trait, and everything in between is
//! synchronous, deterministic, and testable.
//!
//! ## Features
//!
//! - **HMAC-SHA256 identity tokens** — stateless, constant-time verified,
//!   with millisecond expiry baked into the signed payload
//! - **Consumable download grants** — persisted, use-capped, expiring,
//!   redeemed through one atomic conditional consume
//! - **Agent keys** — `agent_`-prefixed bearer keys, Argon2id-hashed at
//!   rest, with per-credential capabilities and role-based bypass
//! - **Certification ladder** — weighted Bronze/Silver/Gold scoring with
//!   forward-only promotion and manual review gates
//! - **Fail-closed errors** — token and credential failures fold into
//!   opaque categories so callers cannot probe internal state
//!
//! ## Quickstart
//!
//! ```no_run
//! use skillgate::{MemoryTrustStore, TrustConfig, TrustManager};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), skillgate::TrustError> {
//!     let store = Arc::new(MemoryTrustStore::new());
//!     let config = TrustConfig::new("a-32-byte-minimum-signing-secret");
//!     let manager = TrustManager::new(config, store)?;
//!
//!     // Email confirmation: stateless signed token, verified on click.
//!     let token = manager.issue_identity_token("account-1");
//!     manager.confirm_email(&token)?;
//!
//!     // Downloads: purchase-gated grant, consumed per redemption.
//!     let ticket = manager.issue_download_grant("account-1", "artifact-1")?;
//!     let download = manager.redeem_download(&ticket.token)?;
//!     println!("serve {} ({} uses left)", download.storage_url, download.remaining_uses);
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Skillgate protects against:
//! - **Token forgery and tampering** — payloads are HMAC-signed and
//!   compared in constant time
//! - **Grant replay** — redemption is a linearizable conditional consume;
//!   concurrent redeemers past the use cap lose
//! - **Credential theft from storage** — only Argon2id hashes are
//!   persisted; plaintext keys are shown once at creation
//! - **Enumeration** — unknown, expired, revoked, and tampered tokens all
//!   report one opaque error
//!
//! Skillgate does **not** authenticate the transport, deliver email, or
//! process payments; those stay with the surrounding marketplace.
//!
//! ## Configuration
//!
//! - `token_secret` — HMAC signing secret, 32 bytes minimum
//! - `token_ttl` — identity token lifetime (default 24 hours)
//! - `grant_ttl` — download grant lifetime (default 24 hours)
//! - `grant_max_uses` — redemptions per grant (default 3)
//!
//! See [`TrustConfig`] for full documentation.

#![deny(warnings)]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/skillgate/0.1.0")]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Identity tokens
pub mod token;

// Download grants
pub mod grant;

// Agent credentials
pub mod agent;

// Certification ladder
pub mod cert;

// Persistence boundary
pub mod store;

// Wire formats
pub mod protocol;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use agent::{AgentCredential, AgentIdentity, Permission, Role};
pub use cert::{CertLevel, CertificationStatus, QualitySignals};
pub use clock::{Clock, SystemClock};
pub use config::TrustConfig;
pub use errors::TrustError;
pub use grant::GrantTicket;
pub use manager::{RedeemedDownload, TrustManager};
pub use store::{FileTrustStore, MemoryTrustStore};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
