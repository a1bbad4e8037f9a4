//! Password-reset token issuance and consumption.
//!
//! A reset request deletes the user's earlier tokens and stores a fresh one
//! before the link is mailed. Confirming a token deletes its row and, if it
//! was still live, replaces the password hash in the same store operation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::auth::password;
use crate::email::Notifier;
use crate::models::user::{is_valid_email, normalize_email};
use crate::models::PasswordResetToken;
use crate::store::{Consumption, CredentialStore, ResetLedger, StoreError};

pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

#[derive(Debug)]
pub enum ResetError {
    Validation(String),
    NotFound,
    InvalidToken,
    ExpiredToken,
    Delivery(String),
    Internal(String),
    Store(StoreError),
}

impl std::fmt::Display for ResetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetError::Validation(msg) => write!(f, "Validation: {msg}"),
            ResetError::NotFound => write!(f, "No account found with that email"),
            ResetError::InvalidToken => write!(f, "Invalid or already used reset token"),
            ResetError::ExpiredToken => write!(f, "Reset token has expired"),
            ResetError::Delivery(msg) => write!(f, "Delivery failed: {msg}"),
            ResetError::Internal(msg) => write!(f, "Internal: {msg}"),
            ResetError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ResetError {}

impl From<StoreError> for ResetError {
    fn from(err: StoreError) -> Self {
        ResetError::Store(err)
    }
}

pub struct PasswordReset {
    users: Arc<dyn CredentialStore>,
    ledger: Arc<dyn ResetLedger>,
    notifier: Arc<dyn Notifier>,
    base_url: String,
    ttl: Duration,
}

impl PasswordReset {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        ledger: Arc<dyn ResetLedger>,
        notifier: Arc<dyn Notifier>,
        base_url: &str,
        ttl_secs: i64,
    ) -> Self {
        Self {
            users,
            ledger,
            notifier,
            base_url: base_url.trim_end_matches('/').to_string(),
            ttl: Duration::try_seconds(ttl_secs).unwrap_or(Duration::MAX),
        }
    }

    pub async fn request(&self, email: &str) -> Result<(), ResetError> {
        self.request_at(email, Utc::now()).await
    }

    pub async fn request_at(&self, email: &str, now: DateTime<Utc>) -> Result<(), ResetError> {
        if !is_valid_email(email) {
            return Err(ResetError::Validation(
                "Enter a valid email address".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .filter(|u| u.is_active)
            .ok_or(ResetError::NotFound)?;

        let token = generate_token();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ResetError::Internal("reset token expiry overflows".to_string()))?;
        let row = PasswordResetToken::new(user.id, hash_token(&token), now, expires_at);
        let row = self.ledger.replace_for_user(row).await?;

        tracing::info!(
            user_id = %user.id,
            expires_at = %row.expires_at,
            "Password reset token issued"
        );

        // The new row is committed before the link leaves the process.
        let reset_url = self.reset_url(&token);
        self.notifier
            .send_password_reset(&user.email, &reset_url, self.ttl.num_minutes())
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, "Failed to send password reset email: {e}");
                ResetError::Delivery(e)
            })
    }

    pub async fn confirm(&self, token: &str, new_password: &str) -> Result<(), ResetError> {
        self.confirm_at(token, new_password, Utc::now()).await
    }

    pub async fn confirm_at(
        &self,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ResetError> {
        if token.is_empty() || new_password.is_empty() {
            return Err(ResetError::Validation(
                "Both token and password are required".to_string(),
            ));
        }
        password::check_strength(new_password).map_err(ResetError::Validation)?;

        let pw_hash = password::hash(new_password).map_err(ResetError::Internal)?;

        match self.ledger.consume(&hash_token(token), &pw_hash, now).await? {
            Consumption::Consumed { user_id } => {
                tracing::info!(%user_id, "Password reset completed");
                Ok(())
            }
            Consumption::Expired => {
                tracing::debug!("Expired reset token presented and retired");
                Err(ResetError::ExpiredToken)
            }
            Consumption::Missing => Err(ResetError::InvalidToken),
        }
    }

    /// Delete expired ledger rows. Safe to run alongside live requests.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ResetError> {
        Ok(self.ledger.purge_expired(now).await?)
    }

    fn reset_url(&self, token: &str) -> String {
        format!("{}/auth/reset-password?token={token}", self.base_url)
    }
}

/// 32 bytes from the OS RNG, hex encoded.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{NewUser, Role};
    use crate::store::memory::MemoryStore;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl Outbox {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn last_token(&self) -> String {
            let sent = self.sent.lock().unwrap();
            let (_, url) = sent.last().expect("no email sent");
            url.split("token=").nth(1).unwrap().to_string()
        }

        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Notifier for Outbox {
        async fn send_password_reset(
            &self,
            to_email: &str,
            reset_url: &str,
            _ttl_minutes: i64,
        ) -> Result<(), String> {
            self.sent
                .lock()
                .unwrap()
                .push((to_email.to_string(), reset_url.to_string()));
            if self.fail {
                Err("relay refused connection".to_string())
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        outbox: Arc<Outbox>,
        reset: PasswordReset,
        alice: crate::models::User,
    }

    async fn fixture_with(outbox: Outbox) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(outbox);
        let alice = store
            .create_user(NewUser {
                email: "alice@example.com".to_string(),
                username: "alice".to_string(),
                password_hash: password::hash("OldPass123").unwrap(),
                role: Role::Student,
            })
            .await
            .unwrap();
        let reset = PasswordReset::new(
            store.clone(),
            store.clone(),
            outbox.clone(),
            "https://careers.example/",
            DEFAULT_TOKEN_TTL_SECS,
        );
        Fixture {
            store,
            outbox,
            reset,
            alice,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(Outbox::default()).await
    }

    async fn current_hash(f: &Fixture) -> String {
        f.store
            .find_by_id(f.alice.id)
            .await
            .unwrap()
            .unwrap()
            .password_hash
    }

    #[tokio::test]
    async fn request_then_confirm_updates_the_password() {
        let f = fixture().await;
        let t0 = Utc::now();

        f.reset.request_at("alice@example.com", t0).await.unwrap();
        let token = f.outbox.last_token();
        assert_eq!(token.len(), 64);

        let live = f.store.outstanding_for_user(f.alice.id, t0).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].expires_at, t0 + Duration::hours(1));
        assert_ne!(live[0].token_hash, token);

        f.reset
            .confirm_at(&token, "NewPass123", t0 + Duration::minutes(30))
            .await
            .unwrap();

        assert!(password::verify("NewPass123", &current_hash(&f).await).unwrap());
        assert_eq!(f.store.token_count().await, 0);

        let again = f.reset.confirm_at(&token, "Another123", t0).await;
        assert!(matches!(again, Err(ResetError::InvalidToken)));
    }

    #[tokio::test]
    async fn link_is_sent_to_the_registered_address() {
        let f = fixture().await;
        f.reset.request("  ALICE@example.com ").await.unwrap();

        let sent = f.outbox.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "alice@example.com");
        assert!(sent[0].1.starts_with("https://careers.example/auth/reset-password?token="));
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let f = fixture().await;
        let err = f.reset.request("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, ResetError::NotFound));
        assert_eq!(f.outbox.count(), 0);
    }

    #[tokio::test]
    async fn oversized_ttl_fails_without_panicking() {
        let f = fixture().await;
        for ttl_secs in [1_000_000_000_000_000, i64::MAX] {
            let reset = PasswordReset::new(
                f.store.clone(),
                f.store.clone(),
                f.outbox.clone(),
                "https://careers.example",
                ttl_secs,
            );
            let err = reset.request("alice@example.com").await.unwrap_err();
            assert!(matches!(err, ResetError::Internal(_)), "{ttl_secs}: {err}");
        }
        assert_eq!(f.store.token_count().await, 0);
        assert_eq!(f.outbox.count(), 0);
    }

    #[tokio::test]
    async fn inactive_account_is_not_found() {
        let f = fixture().await;
        f.store.set_active(f.alice.id, false).await.unwrap();

        let err = f.reset.request("alice@example.com").await.unwrap_err();
        assert!(matches!(err, ResetError::NotFound));
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_before_lookup() {
        let f = fixture().await;
        for email in ["", "alice", "alice@", "alice @example.com"] {
            let err = f.reset.request(email).await.unwrap_err();
            assert!(matches!(err, ResetError::Validation(_)), "{email:?}");
        }
        assert_eq!(f.store.token_count().await, 0);
    }

    #[tokio::test]
    async fn reissuing_leaves_exactly_one_token() {
        let f = fixture().await;
        let t0 = Utc::now();

        for i in 0..5 {
            f.reset
                .request_at("alice@example.com", t0 + Duration::seconds(i))
                .await
                .unwrap();
        }

        let live = f.store.outstanding_for_user(f.alice.id, t0).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(f.store.token_count().await, 1);
    }

    #[tokio::test]
    async fn reissuing_invalidates_the_earlier_token() {
        let f = fixture().await;
        f.reset.request("alice@example.com").await.unwrap();
        let first = f.outbox.last_token();
        f.reset.request("alice@example.com").await.unwrap();
        let second = f.outbox.last_token();
        assert_ne!(first, second);

        let err = f.reset.confirm(&first, "NewPass123").await.unwrap_err();
        assert!(matches!(err, ResetError::InvalidToken));

        f.reset.confirm(&second, "NewPass123").await.unwrap();
    }

    #[tokio::test]
    async fn expired_token_is_rejected_then_gone() {
        let f = fixture().await;
        let t0 = Utc::now();
        f.reset.request_at("alice@example.com", t0).await.unwrap();
        let token = f.outbox.last_token();
        let before = current_hash(&f).await;

        let late = t0 + Duration::hours(1) + Duration::seconds(1);
        let err = f.reset.confirm_at(&token, "NewPass123", late).await.unwrap_err();
        assert!(matches!(err, ResetError::ExpiredToken));
        assert_eq!(f.store.token_count().await, 0);

        let err = f.reset.confirm_at(&token, "NewPass123", late).await.unwrap_err();
        assert!(matches!(err, ResetError::InvalidToken));
        assert_eq!(current_hash(&f).await, before);
    }

    #[tokio::test]
    async fn token_expires_exactly_at_the_deadline() {
        let f = fixture().await;
        let t0 = Utc::now();
        f.reset.request_at("alice@example.com", t0).await.unwrap();
        let token = f.outbox.last_token();

        let err = f
            .reset
            .confirm_at(&token, "NewPass123", t0 + Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ResetError::ExpiredToken));
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() {
        let f = fixture().await;
        f.reset.request("alice@example.com").await.unwrap();
        let token = f.outbox.last_token();

        assert!(matches!(
            f.reset.confirm("", "NewPass123").await,
            Err(ResetError::Validation(_))
        ));
        assert!(matches!(
            f.reset.confirm(&token, "").await,
            Err(ResetError::Validation(_))
        ));
        assert!(matches!(
            f.reset.confirm(&token, "short").await,
            Err(ResetError::Validation(_))
        ));

        // Rejected input must not burn the token.
        f.reset.confirm(&token, "NewPass123").await.unwrap();
    }

    #[tokio::test]
    async fn delivery_failure_keeps_the_token_valid() {
        let f = fixture_with(Outbox::failing()).await;

        let err = f.reset.request("alice@example.com").await.unwrap_err();
        assert!(matches!(err, ResetError::Delivery(_)));
        assert_eq!(f.store.token_count().await, 1);

        let token = f.outbox.last_token();
        f.reset.confirm(&token, "NewPass123").await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_confirmations_succeed_once() {
        let f = fixture().await;
        f.reset.request("alice@example.com").await.unwrap();
        let token = f.outbox.last_token();

        let (a, b) = tokio::join!(
            f.reset.confirm(&token, "FirstPass123"),
            f.reset.confirm(&token, "SecondPass123"),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(ResetError::InvalidToken)));
    }

    #[tokio::test]
    async fn concurrent_requests_leave_one_token() {
        let f = fixture().await;

        let (a, b, c) = tokio::join!(
            f.reset.request("alice@example.com"),
            f.reset.request("alice@example.com"),
            f.reset.request("alice@example.com"),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(f.store.token_count().await, 1);
    }

    #[tokio::test]
    async fn purge_spares_live_tokens() {
        let f = fixture().await;
        let t0 = Utc::now();
        f.reset.request_at("alice@example.com", t0).await.unwrap();

        assert_eq!(f.reset.purge_expired(t0 + Duration::minutes(59)).await.unwrap(), 0);
        assert_eq!(f.reset.purge_expired(t0 + Duration::hours(1)).await.unwrap(), 1);
    }

    #[test]
    fn tokens_are_unique_and_hashed() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(hash_token(&a), hash_token(&a));
        assert_ne!(hash_token(&a), a);
        assert_eq!(hash_token(&a).len(), 64);
    }
}
