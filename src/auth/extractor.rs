use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::models::Role;
use crate::policy::{self, Decision, EndpointClass, Scope, Tier};
use crate::state::SharedState;
use crate::store::CredentialStore;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }

    pub fn tier(&self) -> Tier {
        if self.is_admin() {
            Tier::Admin
        } else {
            Tier::Member
        }
    }
}

/// Whoever sent the request: an authenticated user or nobody.
///
/// A request without an `Authorization` header is anonymous. A header that
/// is present but invalid is rejected outright rather than downgraded.
#[derive(Debug, Clone)]
pub struct Requester(pub Option<AuthUser>);

/// Outcome of a successful policy check.
#[derive(Debug, Clone)]
pub struct Access {
    pub user: Option<AuthUser>,
    pub scope: Scope,
}

impl Access {
    /// The authenticated user. Always present for classes that deny anonymous.
    pub fn user(&self) -> Result<&AuthUser, AppError> {
        self.user
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

impl Requester {
    pub fn tier(&self) -> Tier {
        self.0.as_ref().map_or(Tier::Anonymous, AuthUser::tier)
    }

    /// Like [`Requester::authorize`], but re-reads the account first so a
    /// deactivation or role change applies before the access token expires.
    pub async fn authorize_current(
        self,
        class: EndpointClass,
        users: &dyn CredentialStore,
    ) -> Result<Access, AppError> {
        let Some(mut user) = self.0 else {
            return Requester(None).authorize(class);
        };

        let current = users
            .find_by_id(user.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("Account is disabled".to_string()))?;
        user.role = current.role;

        Requester(Some(user)).authorize(class)
    }

    pub fn authorize(self, class: EndpointClass) -> Result<Access, AppError> {
        let tier = self.tier();
        match (policy::decide(class, tier), self.0) {
            (Decision::Allow, user) => Ok(Access {
                user,
                scope: Scope::Any,
            }),
            (Decision::Scoped, Some(user)) => Ok(Access {
                scope: Scope::Owner(user.user_id),
                user: Some(user),
            }),
            (Decision::Scoped, None) | (Decision::Deny, None) => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
            (Decision::Deny, Some(user)) => {
                tracing::debug!(user_id = %user.user_id, ?class, "Access denied");
                Err(AppError::Forbidden(
                    "You do not have permission to perform this action".to_string(),
                ))
            }
        }
    }
}

impl FromRequestParts<SharedState> for Requester {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
            return Ok(Requester(None));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(Requester(Some(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })))
    }
}
