//! Stateless signed identity tokens.
//!
//! A single-use intent (e.g. "confirm this email address") is proven with a
//! self-contained, time-bounded token instead of a persisted session. No
//! revocation list exists; the blast radius of a leaked token is bounded by
//! its TTL.

pub mod codec;

pub use codec::TokenCodec;
