use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Consumption, CredentialStore, ResetLedger, StoreError};
use crate::db;
use crate::models::{NewUser, PasswordResetToken, Role, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        Ok(db::users::create(&self.pool, &user).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(db::users::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(db::users::find_by_id(&self.pool, id).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(db::users::list_all(&self.pool).await?)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(db::users::delete(&self.pool, id).await?)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
        Ok(db::users::update_role(&self.pool, id, role.as_str()).await?)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, StoreError> {
        Ok(db::users::update_active(&self.pool, id, active).await?)
    }
}

#[async_trait]
impl ResetLedger for PgStore {
    async fn replace_for_user(
        &self,
        token: PasswordResetToken,
    ) -> Result<PasswordResetToken, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent issuances for the same user queue up behind this lock.
        if !db::users::lock(&mut *tx, token.user_id).await? {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        let purged = db::password_reset_tokens::delete_all_for_user(&mut *tx, token.user_id).await?;
        let created = db::password_reset_tokens::create(&mut *tx, &token).await?;

        tx.commit().await?;

        if purged > 0 {
            tracing::debug!(user_id = %token.user_id, purged, "Superseded earlier reset tokens");
        }
        Ok(created)
    }

    async fn consume(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Consumption, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = db::password_reset_tokens::take_by_hash(&mut *tx, token_hash).await? else {
            tx.rollback().await?;
            return Ok(Consumption::Missing);
        };

        if row.is_expired(now) {
            // Keep the delete: expired rows are retired on read.
            tx.commit().await?;
            return Ok(Consumption::Expired);
        }

        if !db::users::update_password(&mut *tx, row.user_id, new_password_hash).await? {
            tx.rollback().await?;
            return Ok(Consumption::Missing);
        }

        tx.commit().await?;
        Ok(Consumption::Consumed {
            user_id: row.user_id,
        })
    }

    async fn outstanding_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<PasswordResetToken>, StoreError> {
        Ok(db::password_reset_tokens::list_live_for_user(&self.pool, user_id, now).await?)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(db::password_reset_tokens::delete_expired(&self.pool, now).await?)
    }
}
