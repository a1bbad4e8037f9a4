use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiJson, MessageResponse};
use crate::auth::extractor::Requester;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::policy::EndpointClass;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateUser {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

pub async fn list_users(
    requester: Requester,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    requester
        .authorize_current(EndpointClass::UserAdmin, state.users.as_ref())
        .await?;
    let users = state.users.list_users().await?;
    Ok(Json(users))
}

pub async fn update_user(
    requester: Requester,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateUser>,
) -> Result<Json<User>, AppError> {
    let access = requester
        .authorize_current(EndpointClass::UserAdmin, state.users.as_ref())
        .await?;
    let admin_id = access.user()?.user_id;

    if id == admin_id && (req.role.is_some_and(|r| r != Role::Admin) || req.is_active == Some(false)) {
        return Err(AppError::BadRequest(
            "Admins cannot demote or deactivate themselves".to_string(),
        ));
    }

    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(role) = req.role {
        user = state
            .users
            .set_role(id, role)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    }
    if let Some(active) = req.is_active {
        user = state
            .users
            .set_active(id, active)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    }

    tracing::info!(%admin_id, user_id = %id, role = %user.role, active = user.is_active, "User updated");

    Ok(Json(user))
}

pub async fn delete_user(
    requester: Requester,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let access = requester
        .authorize_current(EndpointClass::UserAdmin, state.users.as_ref())
        .await?;
    let admin_id = access.user()?.user_id;

    if id == admin_id {
        return Err(AppError::BadRequest(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    if !state.users.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(%admin_id, user_id = %id, "User deleted");

    Ok(Json(MessageResponse::new("Deleted")))
}
