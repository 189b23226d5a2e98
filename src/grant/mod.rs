//! Persisted, consumable download grants.
//!
//! Unlike identity tokens, download access must be revocable, use-limited,
//! and auditable. A pure signature scheme cannot provide any of that without
//! a revocation store, so grants are opaque persisted records keyed by a
//! high-entropy token.

pub mod record;
pub mod redeem;

pub use record::{ConsumeOutcome, DownloadGrant, GrantTicket};
pub use redeem::DownloadGrants;
