/// In-memory credential store
///
/// Keeps users and refresh tokens behind one mutex. Every trait method takes
/// the lock once and never awaits while holding it, so each call is atomic
/// with respect to every other call. That is enough to give
/// [`rotate_refresh_token`](CredentialStore::rotate_refresh_token) the
/// compare-and-swap behaviour the trait requires.
///
/// # Example
///
/// ```
/// use linkvault_shared::store::{memory::InMemoryCredentialStore, CredentialStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryCredentialStore::new();
/// assert!(store.find_user_by_email("alice@example.com").await?.is_none());
/// # Ok(())
/// # }
/// ```

use super::{CredentialStore, StoreError};
use crate::models::refresh_token::RefreshToken;
use crate::models::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<Uuid, RefreshToken>,
}

/// [`CredentialStore`] held in process memory
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All refresh token records owned by `user_id`, oldest first
    pub fn refresh_tokens_for(&self, user_id: Uuid) -> Vec<RefreshToken> {
        let mut tokens: Vec<RefreshToken> = self
            .lock()
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.created_at);
        tokens
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        let mut state = self.lock();

        if state.users.contains_key(&user.id) || state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }

        state.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.lock();

        let removed = state.users.remove(&id).is_some();
        if removed {
            state.refresh_tokens.retain(|_, t| t.user_id != id);
        }
        Ok(removed)
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<RefreshToken, StoreError> {
        let mut state = self.lock();

        if state.refresh_tokens.contains_key(&token.id)
            || state
                .refresh_tokens
                .values()
                .any(|t| t.token_hash == token.token_hash)
        {
            return Err(StoreError::Conflict);
        }

        state.refresh_tokens.insert(token.id, token.clone());
        Ok(token.clone())
    }

    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        Ok(self
            .lock()
            .refresh_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn rotate_refresh_token(
        &self,
        current_id: Uuid,
        now: DateTime<Utc>,
        replacement: &RefreshToken,
    ) -> Result<Option<RefreshToken>, StoreError> {
        let mut state = self.lock();

        if state
            .refresh_tokens
            .values()
            .any(|t| t.token_hash == replacement.token_hash)
        {
            return Err(StoreError::Conflict);
        }

        match state.refresh_tokens.get_mut(&current_id) {
            Some(current) if current.is_active(now) => current.revoked_at = Some(now),
            _ => return Ok(None),
        }

        state.refresh_tokens.insert(replacement.id, replacement.clone());
        Ok(Some(replacement.clone()))
    }

    async fn revoke_refresh_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut state = self.lock();

        match state
            .refresh_tokens
            .values_mut()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
        {
            Some(token) => {
                token.revoked_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
