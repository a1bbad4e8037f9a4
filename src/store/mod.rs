//! Storage seams for the credential and reset-token subsystem.
//!
//! [`CredentialStore`] owns user identity records and [`ResetLedger`] owns
//! outstanding password-reset tokens. Both are implemented over PostgreSQL
//! ([`postgres::PgStore`]) and in-process ([`memory::MemoryStore`]).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{NewUser, PasswordResetToken, Role, User};

#[derive(Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    Conflict(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            StoreError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Result of presenting a token to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumption {
    /// The row was deleted by this call and the credential was replaced.
    Consumed { user_id: Uuid },
    /// The row was deleted by this call but had already expired.
    Expired,
    /// No row matched: never issued, already used, or superseded.
    Missing,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait ResetLedger: Send + Sync {
    /// Delete every token owned by the user, then insert `token`.
    ///
    /// Runs as one unit, serialized per user, so the user never has two
    /// outstanding tokens once this returns.
    async fn replace_for_user(
        &self,
        token: PasswordResetToken,
    ) -> Result<PasswordResetToken, StoreError>;

    /// Delete the row matching `token_hash` and, if it was still live at
    /// `now`, store `new_password_hash` for its owner in the same unit.
    ///
    /// Deleting the row is the gate: of several concurrent calls for one
    /// token, only the one that removed the row may touch the credential.
    async fn consume(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Consumption, StoreError>;

    async fn outstanding_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<PasswordResetToken>, StoreError>;

    /// Remove every row whose expiry is at or before `now`. Idempotent.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
