/// Access token issuance
///
/// Access tokens are short-lived JWTs signed with HS256 (HMAC-SHA256). They
/// carry the caller's identity (user id, email, display name) plus issuer and
/// audience, and are verified without touching the database by
/// [`AuthenticationGateway`](crate::auth::gateway::AuthenticationGateway).
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Lifetime**: configurable, 15 minutes by default
/// - **Secret**: at least 32 bytes (256 bits), checked when the issuer is built
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::Utc;
/// use linkvault_shared::auth::config::JwtConfig;
/// use linkvault_shared::auth::jwt::AccessTokenIssuer;
/// use linkvault_shared::clock::SystemClock;
/// use linkvault_shared::models::user::User;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(JwtConfig::with_secret("0123456789abcdef0123456789abcdef"));
/// let issuer = AccessTokenIssuer::new(config, Arc::new(SystemClock))?;
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
/// assert_eq!(token.token.split('.').count(), 3);
/// # Ok(())
/// # }
/// ```

use crate::auth::config::{JwtConfig, MIN_SECRET_LENGTH};
use crate::clock::Clock;
use crate::models::user::User;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// No signing secret configured
    #[error("JWT signing secret is not configured")]
    MissingSigningKey,

    /// Signing secret is too short for HS256
    #[error("JWT signing secret must be at least {MIN_SECRET_LENGTH} bytes, got {length}")]
    WeakSigningKey { length: usize },

    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID, hyphenated string form)
/// - `iss`: Issuer
/// - `aud`: Audience
/// - `iat`: Issued at timestamp
/// - `nbf`: Not before timestamp
/// - `exp`: Expiration timestamp
/// - `jti`: Unique token id, so two tokens minted in the same second differ
///
/// # Custom Claims
///
/// - `email`: Normalized email address
/// - `name`: Display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: String,

    /// User email
    pub email: String,

    /// Display name
    pub name: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

impl Claims {
    /// Builds claims for `user` valid from `now` until `expires_at`
    pub fn for_user(config: &JwtConfig, user: &User, now: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Parses the subject as a user id
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Signed access token and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Compact JWT
    pub token: String,

    /// Expiration time, truncated to whole seconds like the `exp` claim
    pub expires_at: DateTime<Utc>,
}

/// Creates and signs access tokens
#[derive(Clone)]
pub struct AccessTokenIssuer {
    config: Arc<JwtConfig>,
    clock: Arc<dyn Clock>,
    key: EncodingKey,
}

impl AccessTokenIssuer {
    /// Creates an issuer from token settings
    ///
    /// # Errors
    ///
    /// Returns `JwtError::MissingSigningKey` if the secret is empty and
    /// `JwtError::WeakSigningKey` if it is shorter than 32 bytes. Both are
    /// startup failures.
    pub fn new(config: Arc<JwtConfig>, clock: Arc<dyn Clock>) -> Result<Self, JwtError> {
        check_secret(&config.secret)?;
        let key = EncodingKey::from_secret(config.secret.as_bytes());

        Ok(Self { config, clock, key })
    }

    /// Issues an access token for `user`
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if encoding fails
    pub fn issue(&self, user: &User) -> Result<AccessToken, JwtError> {
        let now = self.clock.now();
        let expires_at = now + self.config.access_token_lifetime();
        let claims = Claims::for_user(&self.config, user, now, expires_at);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))?;

        Ok(AccessToken {
            token,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }
}

/// Rejects missing or short signing secrets
pub(crate) fn check_secret(secret: &str) -> Result<(), JwtError> {
    if secret.is_empty() {
        return Err(JwtError::MissingSigningKey);
    }
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(JwtError::WeakSigningKey {
            length: secret.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$unused".to_string(),
            created_at: Utc::now(),
        }
    }

    fn decode_claims(token: &str) -> Claims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["linkvault"]);
        validation.validate_exp = false;
        decode::<Claims>(token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
            .expect("token should decode")
            .claims
    }

    #[test]
    fn test_issue_carries_identity_claims() {
        let clock = ManualClock::default();
        let issuer =
            AccessTokenIssuer::new(Arc::new(JwtConfig::with_secret(SECRET)), Arc::new(clock.clone())).unwrap();
        let user = user();

        let access = issuer.issue(&user).expect("Should issue token");
        let claims = decode_claims(&access.token);

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.user_id(), Some(user.id));
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.iss, "linkvault");
        assert_eq!(claims.aud, "linkvault");
        assert_eq!(claims.iat, clock.now().timestamp());
    }

    #[test]
    fn test_expiry_uses_access_lifetime() {
        let clock = ManualClock::default();
        let issuer =
            AccessTokenIssuer::new(Arc::new(JwtConfig::with_secret(SECRET)), Arc::new(clock.clone())).unwrap();

        let access = issuer.issue(&user()).unwrap();
        let claims = decode_claims(&access.token);

        assert_eq!(access.expires_at, clock.now() + Duration::minutes(15));
        assert_eq!(claims.exp, access.expires_at.timestamp());
    }

    #[test]
    fn test_tokens_are_unique_within_a_second() {
        let issuer = AccessTokenIssuer::new(
            Arc::new(JwtConfig::with_secret(SECRET)),
            Arc::new(ManualClock::default()),
        )
        .unwrap();
        let user = user();

        let first = issuer.issue(&user).unwrap();
        let second = issuer.issue(&user).unwrap();

        assert_eq!(first.expires_at, second.expires_at);
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let result = AccessTokenIssuer::new(Arc::new(JwtConfig::default()), Arc::new(ManualClock::default()));
        assert!(matches!(result, Err(JwtError::MissingSigningKey)));
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let result = AccessTokenIssuer::new(
            Arc::new(JwtConfig::with_secret("too-short")),
            Arc::new(ManualClock::default()),
        );
        assert!(matches!(result, Err(JwtError::WeakSigningKey { length: 9 })));
    }
}
