/// Opaque refresh token generation
///
/// A refresh token is 64 bytes (512 bits) from the OS random source,
/// base64url-encoded without padding so it can travel in a cookie unescaped.
/// The factory returns the plaintext together with its digest and expiry; only
/// the digest is ever persisted.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use linkvault_shared::auth::config::JwtConfig;
/// use linkvault_shared::auth::refresh_token::RefreshTokenFactory;
/// use linkvault_shared::clock::SystemClock;
///
/// let factory = RefreshTokenFactory::new(Arc::new(JwtConfig::default()), Arc::new(SystemClock));
/// let issued = factory.create();
///
/// assert_eq!(issued.plaintext.expose().len(), 86);
/// assert_eq!(issued.hash.len(), 64);
/// ```

use crate::auth::config::JwtConfig;
use crate::auth::token_hash::TokenHasher;
use crate::clock::Clock;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use std::sync::Arc;

/// Number of random bytes in a refresh token
pub const REFRESH_TOKEN_BYTES: usize = 64;

/// Refresh token plaintext
///
/// Handed to the caller exactly once. `Debug` output is redacted so the value
/// cannot end up in logs through a stray `{:?}`.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshTokenSecret(String);

impl RefreshTokenSecret {
    /// Wraps a plaintext presented by a client
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self(plaintext.into())
    }

    /// Borrows the plaintext for transport
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshTokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshTokenSecret").field(&"[REDACTED]").finish()
    }
}

/// Freshly minted refresh token
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// Plaintext for the client
    pub plaintext: RefreshTokenSecret,

    /// Digest to persist
    pub hash: String,

    /// When the token stops being redeemable
    pub expires_at: DateTime<Utc>,
}

/// Creates refresh tokens
#[derive(Clone)]
pub struct RefreshTokenFactory {
    config: Arc<JwtConfig>,
    clock: Arc<dyn Clock>,
    hasher: TokenHasher,
}

impl RefreshTokenFactory {
    /// Creates a factory using the configured refresh lifetime
    pub fn new(config: Arc<JwtConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            hasher: TokenHasher,
        }
    }

    /// Generates a new token, its digest and its expiry
    pub fn create(&self) -> IssuedRefreshToken {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);

        let plaintext = URL_SAFE_NO_PAD.encode(bytes);
        let hash = self.hasher.digest(&plaintext);

        IssuedRefreshToken {
            plaintext: RefreshTokenSecret(plaintext),
            hash,
            expires_at: self.clock.now() + self.config.refresh_token_lifetime(),
        }
    }

    /// Digest of a presented plaintext, for lookup
    pub fn digest(&self, plaintext: &RefreshTokenSecret) -> String {
        self.hasher.digest(plaintext.expose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use std::collections::HashSet;

    fn factory(clock: ManualClock) -> RefreshTokenFactory {
        RefreshTokenFactory::new(Arc::new(JwtConfig::default()), Arc::new(clock))
    }

    #[test]
    fn test_token_carries_512_bits() {
        let issued = factory(ManualClock::default()).create();
        let decoded = URL_SAFE_NO_PAD
            .decode(issued.plaintext.expose())
            .expect("plaintext is base64url");

        assert_eq!(decoded.len(), REFRESH_TOKEN_BYTES);
    }

    #[test]
    fn test_hash_matches_plaintext() {
        let factory = factory(ManualClock::default());
        let issued = factory.create();

        assert_eq!(issued.hash, TokenHasher.digest(issued.plaintext.expose()));
        assert_eq!(issued.hash, factory.digest(&issued.plaintext));
    }

    #[test]
    fn test_expiry_uses_refresh_lifetime() {
        let clock = ManualClock::default();
        let issued = factory(clock.clone()).create();

        assert_eq!(issued.expires_at, clock.now() + Duration::days(7));
    }

    #[test]
    fn test_tokens_are_unique() {
        let factory = factory(ManualClock::default());
        let tokens: HashSet<String> = (0..100)
            .map(|_| factory.create().plaintext.expose().to_string())
            .collect();

        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_plaintext_is_cookie_safe() {
        let issued = factory(ManualClock::default()).create();
        assert!(issued
            .plaintext
            .expose()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_debug_is_redacted() {
        let issued = factory(ManualClock::default()).create();
        let debug = format!("{:?}", issued);

        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(issued.plaintext.expose()));
    }
}
