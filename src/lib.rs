pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod policy;
pub mod rate_limit;
pub mod reset;
pub mod routes;
pub mod state;
pub mod store;
pub mod sweeper;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::{LogNotifier, Notifier, SystemMailer};
use crate::rate_limit::{LoginRateLimiter, ResetConfirmRateLimiter};
use crate::reset::PasswordReset;
use crate::state::{AppState, SharedState};
use crate::store::postgres::PgStore;
use crate::store::{CredentialStore, ResetLedger};

/// Build the application backed by PostgreSQL and the configured mailer.
pub fn build_app(pool: PgPool, config: Config) -> (Router, SharedState) {
    let notifier: Arc<dyn Notifier> = match config.smtp.as_ref().map(SystemMailer::new) {
        Some(Ok(mailer)) => {
            tracing::info!("System SMTP configured");
            Arc::new(mailer)
        }
        Some(Err(e)) => {
            tracing::warn!("System SMTP not available: {e}");
            Arc::new(LogNotifier)
        }
        None => Arc::new(LogNotifier),
    };

    let store = Arc::new(PgStore::new(pool.clone()));
    build_app_with(pool, config, store.clone(), store, notifier)
}

/// Build the application over explicit credential, ledger and mail backends.
pub fn build_app_with(
    pool: PgPool,
    config: Config,
    users: Arc<dyn CredentialStore>,
    ledger: Arc<dyn ResetLedger>,
    notifier: Arc<dyn Notifier>,
) -> (Router, SharedState) {
    let password_reset = PasswordReset::new(
        users.clone(),
        ledger,
        notifier,
        &config.base_url,
        config.reset_token_ttl_secs,
    );

    let cors = cors_layer(&config.cors_origins);

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        users,
        password_reset,
        login_limiter: LoginRateLimiter::new(),
        confirm_limiter: ResetConfirmRateLimiter::new(),
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .nest("/api", routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    (app, state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {o}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

async fn health() -> &'static str {
    "ok"
}
