/// Refresh token records
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     revoked_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// A record is live iff `revoked_at IS NULL AND now < expires_at`. Rows are
/// never deleted on rotation or logout, only stamped with `revoked_at`.
///
/// # Rotation
///
/// [`RefreshToken::rotate`] revokes the presented row with a conditional
/// `UPDATE ... WHERE revoked_at IS NULL AND expires_at > $now` and inserts
/// the replacement in the same transaction. Under concurrent rotation of the
/// same row only one `UPDATE` matches; the loser sees zero rows affected and
/// rolls back.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored refresh token
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// SHA-256 hex digest of the plaintext
    pub token_hash: String,

    pub expires_at: DateTime<Utc>,

    /// Set on rotation or logout
    pub revoked_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Input for a new refresh token record
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Builds an unsaved record with a fresh id
    pub fn new(data: CreateRefreshToken, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            token_hash: data.token_hash,
            expires_at: data.expires_at,
            revoked_at: None,
            created_at,
        }
    }

    /// True if the token is not revoked and `now` is before its expiry
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }

    /// True if the token has been revoked
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Inserts a refresh token record
    pub async fn insert(pool: &PgPool, token: &RefreshToken) -> Result<Self, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, token_hash, expires_at, revoked_at, created_at
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .bind(token.created_at)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Finds a record by token digest, whatever its state
    pub async fn find_by_hash(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Revokes `current_id` and inserts `replacement` atomically
    ///
    /// # Returns
    ///
    /// The inserted replacement, or `None` if `current_id` was no longer
    /// live at `now`. In the `None` case nothing is written.
    pub async fn rotate(
        pool: &PgPool,
        current_id: Uuid,
        now: DateTime<Utc>,
        replacement: &RefreshToken,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2
            WHERE id = $1 AND revoked_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(current_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if revoked.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked_at, created_at)
            VALUES ($1, $2, $3, $4, NULL, $5)
            RETURNING id, user_id, token_hash, expires_at, revoked_at, created_at
            "#,
        )
        .bind(replacement.id)
        .bind(replacement.user_id)
        .bind(&replacement.token_hash)
        .bind(replacement.expires_at)
        .bind(replacement.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(inserted))
    }

    /// Revokes the record matching `token_hash` if it is not already revoked
    ///
    /// # Returns
    ///
    /// True if a row changed state
    pub async fn revoke_by_hash(
        pool: &PgPool,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2
            WHERE token_hash = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
