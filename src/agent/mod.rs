//! Hashed agent credentials with capability scoping.
//!
//! Agents are non-interactive callers: CI pipelines, autonomous buyers,
//! audit bots. They authenticate with a bearer key whose plaintext is shown
//! exactly once at creation; only a slow salted hash is persisted. A cheap
//! structural prefix check runs before any persistence access so scanning
//! traffic never reaches the expensive hash path.

pub mod key;
pub mod registry;

pub use key::{Permission, Role, KEY_PREFIX};
pub use registry::{AgentCredential, AgentIdentity, AgentKeyRegistry};
