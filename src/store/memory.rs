use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Consumption, CredentialStore, ResetLedger, StoreError};
use crate::models::{NewUser, PasswordResetToken, Role, User};

/// In-process credential store and reset ledger.
///
/// Every compound operation runs under one lock, which gives the same
/// at-most-once guarantees the PostgreSQL store gets from transactions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// Keyed by token hash, mirroring the UNIQUE column.
    tokens: HashMap<String, PasswordResetToken>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger rows, expired ones included.
    pub async fn token_count(&self) -> usize {
        self.inner.lock().await.tokens.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "duplicate email: {}",
                user.email
            )));
        }

        let created = User {
            id: Uuid::now_v7(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role.as_str().to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        inner.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let removed = inner.users.remove(&id).is_some();
        if removed {
            inner.tokens.retain(|_, t| t.user_id != id);
        }
        Ok(removed)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(&id).map(|u| {
            u.role = role.as_str().to_string();
            u.clone()
        }))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(&id).map(|u| {
            u.is_active = active;
            u.clone()
        }))
    }
}

#[async_trait]
impl ResetLedger for MemoryStore {
    async fn replace_for_user(
        &self,
        token: PasswordResetToken,
    ) -> Result<PasswordResetToken, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.users.contains_key(&token.user_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        if inner.tokens.contains_key(&token.token_hash) {
            return Err(StoreError::Conflict("duplicate token hash".to_string()));
        }

        inner.tokens.retain(|_, t| t.user_id != token.user_id);
        inner.tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn consume(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Consumption, StoreError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let Some(row) = inner.tokens.get(token_hash).cloned() else {
            return Ok(Consumption::Missing);
        };
        if row.is_expired(now) {
            inner.tokens.remove(token_hash);
            return Ok(Consumption::Expired);
        }

        // A deactivated owner leaves the row in place.
        match inner.users.get_mut(&row.user_id) {
            Some(user) if user.is_active => {
                user.password_hash = new_password_hash.to_string();
                inner.tokens.remove(token_hash);
                Ok(Consumption::Consumed {
                    user_id: row.user_id,
                })
            }
            _ => Ok(Consumption::Missing),
        }
    }

    async fn outstanding_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<PasswordResetToken>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tokens
            .values()
            .filter(|t| t.user_id == user_id && !t.is_expired(now))
            .cloned()
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.tokens.len();
        inner.tokens.retain(|_, t| !t.is_expired(now));
        Ok((before - inner.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: "someone".to_string(),
            password_hash: "old-hash".to_string(),
            role: Role::Student,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();

        let err = store.create_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn replace_keeps_only_the_newest_token() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();

        for hash in ["h1", "h2", "h3"] {
            let token =
                PasswordResetToken::new(user.id, hash.to_string(), now, now + Duration::hours(1));
            store.replace_for_user(token).await.unwrap();
        }

        let live = store.outstanding_for_user(user.id, now).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].token_hash, "h3");
        assert_eq!(store.token_count().await, 1);
    }

    #[tokio::test]
    async fn consume_deletes_even_when_expired() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let t0 = Utc::now();
        let token = PasswordResetToken::new(user.id, "h".to_string(), t0, t0 + Duration::hours(1));
        store.replace_for_user(token).await.unwrap();

        let later = t0 + Duration::hours(2);
        assert_eq!(store.consume("h", "new", later).await.unwrap(), Consumption::Expired);
        assert_eq!(store.consume("h", "new", later).await.unwrap(), Consumption::Missing);

        let unchanged = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(unchanged.password_hash, "old-hash");
    }

    #[tokio::test]
    async fn consume_refuses_deactivated_owner() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();
        let token = PasswordResetToken::new(user.id, "h".into(), now, now + Duration::hours(1));
        store.replace_for_user(token).await.unwrap();
        store.set_active(user.id, false).await.unwrap();

        assert_eq!(store.consume("h", "new", now).await.unwrap(), Consumption::Missing);
        let unchanged = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(unchanged.password_hash, "old-hash");
    }

    #[tokio::test]
    async fn purge_removes_only_expired_rows() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob@example.com")).await.unwrap();
        let t0 = Utc::now();

        let stale = PasswordResetToken::new(alice.id, "old".into(), t0, t0 + Duration::minutes(5));
        let fresh = PasswordResetToken::new(bob.id, "new".into(), t0, t0 + Duration::hours(1));
        store.replace_for_user(stale).await.unwrap();
        store.replace_for_user(fresh).await.unwrap();

        let at = t0 + Duration::minutes(10);
        assert_eq!(store.purge_expired(at).await.unwrap(), 1);
        assert_eq!(store.purge_expired(at).await.unwrap(), 0);
        assert_eq!(store.token_count().await, 1);
    }

    #[tokio::test]
    async fn deleting_a_user_drops_their_tokens() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();
        let token = PasswordResetToken::new(user.id, "h".into(), now, now + Duration::hours(1));
        store.replace_for_user(token).await.unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert_eq!(store.token_count().await, 0);
    }
}
