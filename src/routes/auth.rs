use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiJson, MessageResponse};
use crate::auth::extractor::Requester;
use crate::auth::jwt::{self, Claims};
use crate::auth::password;
use crate::error::AppError;
use crate::models::user::{is_valid_email, normalize_email};
use crate::models::{NewUser, Role, User};
use crate::policy::EndpointClass;
use crate::reset::ResetError;
use crate::state::SharedState;
use crate::store::StoreError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct PasswordResetConfirm {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub async fn register(
    State(state): State<SharedState>,
    requester: Result<Requester, AppError>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let access = requester
        .unwrap_or(Requester(None))
        .authorize(EndpointClass::Register)?;

    if !is_valid_email(&req.email) {
        return Err(AppError::BadRequest(
            "Enter a valid email address".to_string(),
        ));
    }
    password::check_strength(&req.password).map_err(AppError::BadRequest)?;

    let role = req.role.unwrap_or_default();
    let creator_is_admin = access.user.as_ref().is_some_and(|u| u.is_admin());
    if role == Role::Admin && !creator_is_admin {
        return Err(AppError::Forbidden(
            "Only an admin can create admin accounts".to_string(),
        ));
    }

    let email = normalize_email(&req.email);
    let username = req
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = state
        .users
        .create_user(NewUser {
            email,
            username,
            password_hash: pw_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                AppError::Conflict("A user with this email already exists".to_string())
            }
            other => AppError::from(other),
        })?;

    tracing::info!(user_id = %user.id, role = %user.role, "Account registered");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email);

    if state.login_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record_failure(&email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }

    state.login_limiter.reset(&email);

    let claims = Claims::new(user.id, user.role.clone());
    let access_token =
        jwt::encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    Ok(Json(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_in: jwt::ACCESS_TOKEN_MINUTES * 60,
    }))
}

pub async fn me(
    State(state): State<SharedState>,
    requester: Requester,
) -> Result<Json<User>, AppError> {
    let access = requester.authorize(EndpointClass::PrivateData)?;
    let user_id = access.user()?.user_id;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

pub async fn password_reset_request(
    State(state): State<SharedState>,
    requester: Result<Requester, AppError>,
    ApiJson(req): ApiJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // A stale session must not lock someone out of recovering their account.
    requester
        .unwrap_or(Requester(None))
        .authorize(EndpointClass::PasswordReset)?;

    let email = req.email.unwrap_or_default();
    state.password_reset.request(&email).await?;

    Ok(Json(MessageResponse::new("Password reset link sent.")))
}

pub async fn password_reset_confirm(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    requester: Result<Requester, AppError>,
    ApiJson(req): ApiJson<PasswordResetConfirm>,
) -> Result<Json<MessageResponse>, AppError> {
    requester
        .unwrap_or(Requester(None))
        .authorize(EndpointClass::PasswordReset)?;

    let ip = addr.ip();
    if state.confirm_limiter.check(ip).is_err() {
        return Err(AppError::RateLimited(
            "Too many password reset attempts. Please try again later.".to_string(),
        ));
    }

    let token = req.token.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    match state.password_reset.confirm(&token, &password).await {
        Ok(()) => Ok(Json(MessageResponse::new("Password has been reset."))),
        Err(err @ (ResetError::InvalidToken | ResetError::ExpiredToken)) => {
            state.confirm_limiter.record_failure(ip);
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
