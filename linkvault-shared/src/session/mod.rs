/// Session lifecycle: registration, login, refresh rotation and logout
///
/// [`SessionService`] owns every refresh token state transition:
///
/// ```text
/// Active ──refresh──▶ Rotated   (revoked, superseded by a new row)
/// Active ──logout───▶ Revoked
/// Active ──time─────▶ Expired   (detected when presented)
/// ```
///
/// All states except `Active` are terminal. The service holds no mutable
/// state of its own; everything lives in the [`CredentialStore`], and the
/// revoke-and-replace step of a refresh is a single store call so that two
/// concurrent refreshes of one token yield exactly one success.
///
/// Every operation takes a [`CancellationToken`]. If it fires first the
/// operation returns [`SessionError::Cancelled`] and the in-flight store
/// future is dropped, which rolls back any open transaction.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use linkvault_shared::auth::config::JwtConfig;
/// use linkvault_shared::auth::password::Argon2PasswordHasher;
/// use linkvault_shared::clock::SystemClock;
/// use linkvault_shared::session::{LoginInput, RegisterInput, SessionService};
/// use linkvault_shared::store::memory::InMemoryCredentialStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = SessionService::new(
///     Arc::new(JwtConfig::with_secret("0123456789abcdef0123456789abcdef")),
///     Arc::new(InMemoryCredentialStore::new()),
///     Arc::new(Argon2PasswordHasher::default()),
///     Arc::new(SystemClock),
/// )?;
/// let cancel = CancellationToken::new();
///
/// service.register(RegisterInput {
///     name: "Alice".into(),
///     email: "alice@example.com".into(),
///     password: "Passw0rd!".into(),
/// }, &cancel).await?;
///
/// let login = service.login(LoginInput {
///     email: "alice@example.com".into(),
///     password: "Passw0rd!".into(),
/// }, &cancel).await?;
///
/// let refreshed = service.refresh(&login.refresh_token.plaintext, &cancel).await?;
/// service.logout(&refreshed.refresh_token.plaintext, &cancel).await?;
/// # Ok(())
/// # }
/// ```

mod error;
mod types;

pub use error::{FieldError, SessionError};
pub use types::{normalize_email, LoginInput, LoginOutcome, RefreshOutcome, RegisterInput};

use crate::auth::config::JwtConfig;
use crate::auth::jwt::{AccessToken, AccessTokenIssuer, JwtError};
use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::refresh_token::{IssuedRefreshToken, RefreshTokenFactory, RefreshTokenSecret};
use crate::clock::Clock;
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, User, UserProfile};
use crate::store::{CredentialStore, StoreError};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Orchestrates the session state machine
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<dyn PasswordHasher>,
    access_tokens: AccessTokenIssuer,
    refresh_tokens: RefreshTokenFactory,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    /// Wires the service to its collaborators
    ///
    /// # Errors
    ///
    /// Fails if the signing secret in `config` is missing or too short
    pub fn new(
        config: Arc<JwtConfig>,
        store: Arc<dyn CredentialStore>,
        passwords: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, JwtError> {
        Ok(Self {
            access_tokens: AccessTokenIssuer::new(config.clone(), clock.clone())?,
            refresh_tokens: RefreshTokenFactory::new(config, clock.clone()),
            store,
            passwords,
            clock,
        })
    }

    /// The store this service writes to
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Creates a user account
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank or overlong name, a malformed email or a
    ///   short password
    /// - `Conflict` if the normalized email is already registered
    pub async fn register(
        &self,
        input: RegisterInput,
        cancel: &CancellationToken,
    ) -> Result<UserProfile, SessionError> {
        cancellable(cancel, self.register_inner(input)).await
    }

    /// Verifies credentials and opens a session
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email or short password
    /// - `Unauthorized` for an unknown email or a wrong password, without
    ///   saying which
    pub async fn login(
        &self,
        input: LoginInput,
        cancel: &CancellationToken,
    ) -> Result<LoginOutcome, SessionError> {
        cancellable(cancel, self.login_inner(input)).await
    }

    /// Redeems a refresh token for a new access token and refresh token
    ///
    /// The presented token is revoked in the same store operation that
    /// persists its replacement.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the token is unknown, revoked, expired, or lost a
    /// concurrent rotation
    pub async fn refresh(
        &self,
        presented: &RefreshTokenSecret,
        cancel: &CancellationToken,
    ) -> Result<RefreshOutcome, SessionError> {
        cancellable(cancel, self.refresh_inner(presented)).await
    }

    /// Revokes a refresh token
    ///
    /// Unknown and already-revoked tokens are accepted silently.
    pub async fn logout(
        &self,
        presented: &RefreshTokenSecret,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        cancellable(cancel, self.logout_inner(presented)).await
    }

    /// Public profile of an authenticated caller
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the user no longer exists
    pub async fn profile(
        &self,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<UserProfile, SessionError> {
        cancellable(cancel, self.profile_inner(user_id)).await
    }

    async fn register_inner(&self, input: RegisterInput) -> Result<UserProfile, SessionError> {
        let input = input.normalized();
        input.validate()?;

        if self
            .store
            .find_user_by_email(&input.email)
            .await
            .map_err(|e| store_failure("find_user_by_email", e))?
            .is_some()
        {
            debug!("Registration rejected: email already registered");
            return Err(email_taken());
        }

        let password_hash = self.hash_password(input.password).await?;
        let user = User::new(
            CreateUser {
                name: input.name,
                email: input.email,
                password_hash,
            },
            self.clock.now(),
        );

        let user = match self.store.insert_user(&user).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration of the same email
            Err(StoreError::Conflict) => return Err(email_taken()),
            Err(e) => return Err(store_failure("insert_user", e)),
        };

        info!(user_id = %user.id, "User registered");
        Ok(user.profile())
    }

    async fn login_inner(&self, input: LoginInput) -> Result<LoginOutcome, SessionError> {
        let input = input.normalized();
        input.validate()?;

        let user = self
            .store
            .find_user_by_email(&input.email)
            .await
            .map_err(|e| store_failure("find_user_by_email", e))?;

        let user = match user {
            Some(user) => user,
            None => {
                // Spend the same hashing cost as a real verification.
                let _ = self.hash_password(input.password).await;
                info!("Login failed: unknown email");
                return Err(SessionError::Unauthorized);
            }
        };

        if !self.verify_password(&user.password_hash, input.password).await? {
            info!(user_id = %user.id, "Login failed: wrong password");
            return Err(SessionError::Unauthorized);
        }

        let access_token = self.issue_access_token(&user)?;
        let refresh_token = self.refresh_tokens.create();

        self.store
            .insert_refresh_token(&self.record_for(&user, &refresh_token))
            .await
            .map_err(|e| store_failure("insert_refresh_token", e))?;

        info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            access_token,
            refresh_token,
            user: user.profile(),
        })
    }

    async fn refresh_inner(&self, presented: &RefreshTokenSecret) -> Result<RefreshOutcome, SessionError> {
        if presented.expose().is_empty() {
            return Err(SessionError::Unauthorized);
        }

        let token_hash = self.refresh_tokens.digest(presented);
        let current = self
            .store
            .find_refresh_token_by_hash(&token_hash)
            .await
            .map_err(|e| store_failure("find_refresh_token_by_hash", e))?
            .ok_or_else(|| {
                debug!("Refresh rejected: unknown token");
                SessionError::Unauthorized
            })?;

        let now = self.clock.now();
        if current.is_revoked() {
            warn!(
                user_id = %current.user_id,
                token_id = %current.id,
                "Refresh rejected: revoked token presented again"
            );
            return Err(SessionError::Unauthorized);
        }
        if !current.is_active(now) {
            debug!(user_id = %current.user_id, token_id = %current.id, "Refresh rejected: token expired");
            return Err(SessionError::Unauthorized);
        }

        let user = self
            .store
            .find_user_by_id(current.user_id)
            .await
            .map_err(|e| store_failure("find_user_by_id", e))?
            .ok_or_else(|| {
                warn!(user_id = %current.user_id, "Refresh rejected: user no longer exists");
                SessionError::Unauthorized
            })?;

        // Sign before rotating: a signing failure must leave the presented
        // token live.
        let access_token = self.issue_access_token(&user)?;
        let refresh_token = self.refresh_tokens.create();
        let replacement = self.record_for(&user, &refresh_token);

        let rotated = self
            .store
            .rotate_refresh_token(current.id, now, &replacement)
            .await
            .map_err(|e| store_failure("rotate_refresh_token", e))?;

        if rotated.is_none() {
            warn!(
                user_id = %current.user_id,
                token_id = %current.id,
                "Refresh rejected: token already rotated concurrently"
            );
            return Err(SessionError::Unauthorized);
        }

        info!(user_id = %user.id, token_id = %replacement.id, "Refresh token rotated");
        Ok(RefreshOutcome {
            access_token,
            refresh_token,
        })
    }

    async fn logout_inner(&self, presented: &RefreshTokenSecret) -> Result<(), SessionError> {
        if presented.expose().is_empty() {
            return Ok(());
        }

        let token_hash = self.refresh_tokens.digest(presented);
        let revoked = self
            .store
            .revoke_refresh_token(&token_hash, self.clock.now())
            .await
            .map_err(|e| store_failure("revoke_refresh_token", e))?;

        if revoked {
            info!("Refresh token revoked on logout");
        } else {
            debug!("Logout with unknown or already revoked token");
        }
        Ok(())
    }

    async fn profile_inner(&self, user_id: Uuid) -> Result<UserProfile, SessionError> {
        self.store
            .find_user_by_id(user_id)
            .await
            .map_err(|e| store_failure("find_user_by_id", e))?
            .map(|user| user.profile())
            .ok_or_else(|| {
                debug!(user_id = %user_id, "Profile requested for missing user");
                SessionError::Unauthorized
            })
    }

    fn issue_access_token(&self, user: &User) -> Result<AccessToken, SessionError> {
        self.access_tokens.issue(user).map_err(|e| {
            error!(user_id = %user.id, error = %e, "Failed to issue access token");
            SessionError::Internal
        })
    }

    fn record_for(&self, user: &User, issued: &IssuedRefreshToken) -> RefreshToken {
        RefreshToken::new(
            CreateRefreshToken {
                user_id: user.id,
                token_hash: issued.hash.clone(),
                expires_at: issued.expires_at,
            },
            self.clock.now(),
        )
    }

    /// Hashes on the blocking pool; Argon2 is deliberately slow
    async fn hash_password(&self, password: String) -> Result<String, SessionError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| {
                error!(error = %e, "Password hashing task failed");
                SessionError::Internal
            })?
            .map_err(|e: PasswordError| {
                error!(error = %e, "Failed to hash password");
                SessionError::Internal
            })
    }

    async fn verify_password(&self, hash: &str, password: String) -> Result<bool, SessionError> {
        let passwords = self.passwords.clone();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || passwords.verify(&hash, &password))
            .await
            .map_err(|e| {
                error!(error = %e, "Password verification task failed");
                SessionError::Internal
            })?
            .map_err(|e: PasswordError| {
                error!(error = %e, "Stored password hash is unreadable");
                SessionError::Internal
            })
    }
}

/// Races `operation` against `cancel`
async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Session operation cancelled");
            Err(SessionError::Cancelled)
        }
        result = operation => result,
    }
}

fn email_taken() -> SessionError {
    SessionError::Conflict("Email is already registered".to_string())
}

/// Logs a store failure with full detail and hides it from the caller
fn store_failure(operation: &'static str, err: StoreError) -> SessionError {
    error!(operation, error = %err, "Credential store operation failed");
    SessionError::Internal
}
