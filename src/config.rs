//! Skillgate configuration.

use std::time::Duration;

/// Minimum accepted length for the token signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Configuration for the trust and certification core.
///
/// Process-wide and immutable after startup: every component receives it
/// through its constructor, nothing reads the environment from inside
/// business logic. Tests build one with a distinct secret per test.
#[derive(Debug, Clone)]
pub struct TrustConfig {
    /// Symmetric secret for identity token MACs.
    ///
    /// SECURITY: inject from deployment secrets at startup. A missing or
    /// short secret is a fatal configuration error, not a per-call failure.
    pub token_secret: String,

    /// Validity window for identity tokens.
    pub token_ttl: Duration,

    /// Validity window for download grants.
    pub grant_ttl: Duration,

    /// Default number of redemptions per download grant.
    pub grant_max_uses: u32,
}

impl TrustConfig {
    /// Create a configuration with the given secret and default windows:
    /// 24 h identity tokens, 24 h download grants, 3 uses per grant.
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            grant_ttl: Duration::from_secs(24 * 60 * 60),
            grant_max_uses: 3,
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::TrustError> {
        if self.token_secret.len() < MIN_SECRET_LEN {
            return Err(crate::TrustError::ConfigError(format!(
                "token_secret must be at least {} bytes, got {}",
                MIN_SECRET_LEN,
                self.token_secret.len()
            )));
        }
        if self.token_ttl.is_zero() {
            return Err(crate::TrustError::ConfigError(
                "token_ttl cannot be zero".to_string(),
            ));
        }
        if self.grant_ttl.is_zero() {
            return Err(crate::TrustError::ConfigError(
                "grant_ttl cannot be zero".to_string(),
            ));
        }
        if self.grant_max_uses == 0 {
            return Err(crate::TrustError::ConfigError(
                "grant_max_uses must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrustError;

    fn secret() -> String {
        "0123456789abcdef0123456789abcdef".to_string()
    }

    #[test]
    fn defaults_are_valid() {
        let config = TrustConfig::new(secret());
        assert!(config.validate().is_ok());
        assert_eq!(config.grant_max_uses, 3);
        assert_eq!(config.token_ttl, Duration::from_secs(86400));
    }

    #[test]
    fn short_secret_rejected() {
        let config = TrustConfig::new("too-short");
        assert!(matches!(
            config.validate(),
            Err(TrustError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_ttl_rejected() {
        let mut config = TrustConfig::new(secret());
        config.token_ttl = Duration::ZERO;
        assert!(matches!(config.validate(), Err(TrustError::ConfigError(_))));
    }

    #[test]
    fn zero_max_uses_rejected() {
        let mut config = TrustConfig::new(secret());
        config.grant_max_uses = 0;
        assert!(matches!(config.validate(), Err(TrustError::ConfigError(_))));
    }
}
