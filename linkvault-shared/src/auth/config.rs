/// Token settings shared by the access token issuer, the refresh token
/// factory and the authentication gateway
///
/// Built once at process start and passed around behind an `Arc`; nothing
/// reads token settings from ambient state.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Minimum signing secret length in bytes for HS256
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default issuer and audience
pub const DEFAULT_ISSUER: &str = "linkvault";

/// Default name of the cookie carrying the refresh token
pub const DEFAULT_REFRESH_COOKIE_NAME: &str = "linkvault_refresh";

/// Default path the refresh cookie is scoped to
pub const DEFAULT_REFRESH_COOKIE_PATH: &str = "/auth";

/// JWT and refresh token configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC signing secret
    ///
    /// Must be at least [`MIN_SECRET_LENGTH`] bytes. Generate with
    /// `openssl rand -hex 32`.
    pub secret: String,

    /// `iss` claim written and required
    pub issuer: String,

    /// `aud` claim written and required
    pub audience: String,

    /// Access token lifetime in minutes
    pub access_token_minutes: i64,

    /// Refresh token lifetime in days
    pub refresh_token_days: i64,

    /// Name of the refresh token cookie
    pub refresh_cookie_name: String,

    /// Path the refresh token cookie is scoped to
    pub refresh_cookie_path: String,

    /// Clock skew tolerated when checking `exp` and `nbf`, in seconds
    pub leeway_seconds: i64,
}

impl JwtConfig {
    /// Creates a configuration with default lifetimes for the given secret
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Access token lifetime
    pub fn access_token_lifetime(&self) -> Duration {
        Duration::minutes(self.access_token_minutes)
    }

    /// Refresh token lifetime
    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::days(self.refresh_token_days)
    }

    /// Clock skew allowance
    pub fn leeway(&self) -> Duration {
        Duration::seconds(self.leeway_seconds)
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_ISSUER.to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
            refresh_cookie_name: DEFAULT_REFRESH_COOKIE_NAME.to_string(),
            refresh_cookie_path: DEFAULT_REFRESH_COOKIE_PATH.to_string(),
            leeway_seconds: 30,
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_minutes", &self.access_token_minutes)
            .field("refresh_token_days", &self.refresh_token_days)
            .field("refresh_cookie_name", &self.refresh_cookie_name)
            .field("refresh_cookie_path", &self.refresh_cookie_path)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JwtConfig::default();
        assert_eq!(config.issuer, "linkvault");
        assert_eq!(config.audience, "linkvault");
        assert_eq!(config.access_token_lifetime(), Duration::minutes(15));
        assert_eq!(config.refresh_token_lifetime(), Duration::days(7));
        assert_eq!(config.leeway(), Duration::seconds(30));
        assert_eq!(config.refresh_cookie_name, "linkvault_refresh");
        assert_eq!(config.refresh_cookie_path, "/auth");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig::with_secret("super-secret-signing-key-value-0123456789");
        let debug = format!("{:?}", config);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("super-secret"));
    }
}
