/// PostgreSQL credential store
///
/// Thin adapter from [`CredentialStore`] to the model queries in
/// [`crate::models`]. Unique-constraint violations surface as
/// [`StoreError::Conflict`]; everything else is passed through as
/// [`StoreError::Database`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use linkvault_shared::db::pool::{create_pool, DatabaseConfig};
/// use linkvault_shared::store::{postgres::PgCredentialStore, CredentialStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool));
/// store.health_check().await?;
/// # Ok(())
/// # }
/// ```

use super::{CredentialStore, StoreError};
use crate::db::pool;
use crate::models::refresh_token::RefreshToken;
use crate::models::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// [`CredentialStore`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations to `Conflict`
fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        User::insert(&self.pool, user).await.map_err(map_write_error)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<RefreshToken, StoreError> {
        RefreshToken::insert(&self.pool, token)
            .await
            .map_err(map_write_error)
    }

    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        Ok(RefreshToken::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn rotate_refresh_token(
        &self,
        current_id: Uuid,
        now: DateTime<Utc>,
        replacement: &RefreshToken,
    ) -> Result<Option<RefreshToken>, StoreError> {
        RefreshToken::rotate(&self.pool, current_id, now, replacement)
            .await
            .map_err(map_write_error)
    }

    async fn revoke_refresh_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(RefreshToken::revoke_by_hash(&self.pool, token_hash, now).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(pool::health_check(&self.pool).await?)
    }
}
