/// Bearer token verification for protected requests
///
/// The gateway checks the HS256 signature with the same secret the
/// [`AccessTokenIssuer`](crate::auth::jwt::AccessTokenIssuer) signs with, then
/// the issuer, audience, `exp` and `nbf` claims. Time checks run against the
/// injected [`Clock`] with the configured skew allowance rather than the
/// system time, so expiry behaves the same in tests as in production.
///
/// Every failure collapses to [`Unauthenticated`]. The reason is logged at
/// debug level and never returned.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::Utc;
/// use linkvault_shared::auth::config::JwtConfig;
/// use linkvault_shared::auth::gateway::AuthenticationGateway;
/// use linkvault_shared::auth::jwt::AccessTokenIssuer;
/// use linkvault_shared::clock::SystemClock;
/// use linkvault_shared::models::user::User;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(JwtConfig::with_secret("0123456789abcdef0123456789abcdef"));
/// let issuer = AccessTokenIssuer::new(config.clone(), Arc::new(SystemClock))?;
/// let gateway = AuthenticationGateway::new(config, Arc::new(SystemClock))?;
///
/// let user = User {
///     id: Uuid::new_v4(),
///     name: "Alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: String::new(),
///     created_at: Utc::now(),
/// };
///
/// let token = issuer.issue(&user)?;
/// assert_eq!(gateway.identify(&token.token)?, user.id);
/// # Ok(())
/// # }
/// ```

use crate::auth::config::JwtConfig;
use crate::auth::jwt::{check_secret, Claims, JwtError};
use crate::clock::Clock;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use uuid::Uuid;

/// The bearer token could not be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unauthenticated")]
pub struct Unauthenticated;

/// Verifies access tokens and extracts the caller's user id
#[derive(Clone)]
pub struct AuthenticationGateway {
    config: Arc<JwtConfig>,
    clock: Arc<dyn Clock>,
    key: DecodingKey,
    validation: Validation,
}

impl AuthenticationGateway {
    /// Creates a gateway from token settings
    ///
    /// # Errors
    ///
    /// Fails on the same missing or weak secrets the issuer rejects
    pub fn new(config: Arc<JwtConfig>, clock: Arc<dyn Clock>) -> Result<Self, JwtError> {
        check_secret(&config.secret)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        // Time claims are checked against the injected clock below.
        validation.validate_exp = false;
        validation.validate_nbf = false;

        Ok(Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
            clock,
            validation,
        })
    }

    /// Verifies a compact JWT and returns the subject's user id
    pub fn identify(&self, token: &str) -> Result<Uuid, Unauthenticated> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                Unauthenticated
            })?
            .claims;

        let now = self.clock.now().timestamp();
        let leeway = self.config.leeway().num_seconds();

        if now - leeway >= claims.exp {
            tracing::debug!(exp = claims.exp, now, "Rejected expired access token");
            return Err(Unauthenticated);
        }
        if now + leeway < claims.nbf {
            tracing::debug!(nbf = claims.nbf, now, "Rejected access token used before nbf");
            return Err(Unauthenticated);
        }

        claims.user_id().ok_or_else(|| {
            tracing::debug!("Rejected access token with malformed subject");
            Unauthenticated
        })
    }

    /// Verifies an `Authorization` header value of the form `Bearer <token>`
    ///
    /// The scheme is matched case-insensitively.
    pub fn identify_header(&self, header_value: &str) -> Result<Uuid, Unauthenticated> {
        let (scheme, token) = header_value.trim().split_once(' ').ok_or(Unauthenticated)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(Unauthenticated);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(Unauthenticated);
        }

        self.identify(token)
    }
}
