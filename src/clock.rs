//! Deterministic clock abstraction for testable time-dependent logic.
//!
//! Every expiry decision in the crate (identity tokens, download grants,
//! credential revocation timestamps) flows through this trait so tests can
//! pin or advance time without sleeping.

use chrono::{DateTime, Utc};

/// Clock trait for deterministic time in tests.
pub trait Clock: Send + Sync {
    /// Get the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current time as milliseconds since the Unix epoch.
    ///
    /// Identity token expiries are encoded in epoch milliseconds, so this
    /// is the unit the token codec compares against.
    fn now_millis(&self) -> i64 {
        self.now_utc().timestamp_millis()
    }
}

/// System clock using actual wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for deterministic testing.
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// component (behind an `Arc<dyn Clock>`) and advance the other.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone)]
pub struct MockClock {
    now: std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Create a mock clock frozen at the given time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Arc::new(std::sync::Mutex::new(now)),
        }
    }

    /// Create a mock clock from an RFC 3339 string.
    pub fn from_rfc3339(s: &str) -> Self {
        Self::new(
            DateTime::parse_from_rfc3339(s)
                .expect("valid RFC 3339")
                .with_timezone(&Utc),
        )
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now = *now + duration;
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
