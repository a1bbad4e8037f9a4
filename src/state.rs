use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::rate_limit::{LoginRateLimiter, ResetConfirmRateLimiter};
use crate::reset::PasswordReset;
use crate::store::CredentialStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub users: Arc<dyn CredentialStore>,
    pub password_reset: PasswordReset,
    pub login_limiter: LoginRateLimiter,
    pub confirm_limiter: ResetConfirmRateLimiter,
}
