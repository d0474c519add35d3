/// Persistence boundary for users and refresh tokens
///
/// [`SessionService`](crate::session::SessionService) only talks to storage
/// through [`CredentialStore`]. Two implementations ship with the crate:
///
/// - [`postgres::PgCredentialStore`]: production store on top of `sqlx`
/// - [`memory::InMemoryCredentialStore`]: single-process store for tests and
///   local experiments
///
/// # Atomicity
///
/// [`CredentialStore::rotate_refresh_token`] must revoke the current record
/// and insert its replacement as one unit, and must refuse to do either if
/// the current record is no longer live. Two concurrent rotations of the same
/// record must produce exactly one `Some`.

pub mod memory;
pub mod postgres;

use crate::models::refresh_token::RefreshToken;
use crate::models::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Record conflicts with an existing record")]
    Conflict,

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage contract for credentials and refresh tokens
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a user by normalized email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks up a user by id
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Persists a new user
    ///
    /// Fails with [`StoreError::Conflict`] if the email is taken.
    async fn insert_user(&self, user: &User) -> Result<User, StoreError>;

    /// Removes a user and every refresh token it owns
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Persists a new refresh token record
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<RefreshToken, StoreError>;

    /// Looks up a refresh token record by digest, in any state
    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, StoreError>;

    /// Atomically revokes `current_id` at `now` and inserts `replacement`
    ///
    /// Returns `None` without writing anything if `current_id` is missing,
    /// revoked or expired at `now`.
    async fn rotate_refresh_token(
        &self,
        current_id: Uuid,
        now: DateTime<Utc>,
        replacement: &RefreshToken,
    ) -> Result<Option<RefreshToken>, StoreError>;

    /// Revokes the record matching `token_hash` unless already revoked
    ///
    /// Returns true if a record changed state.
    async fn revoke_refresh_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Verifies the backing store is reachable
    async fn health_check(&self) -> Result<(), StoreError>;
}
