use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiJson, MessageResponse};
use crate::auth::extractor::Requester;
use crate::db;
use crate::error::AppError;
use crate::models::Bookmark;
use crate::policy::EndpointClass;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateBookmark {
    pub career_id: Uuid,
}

pub async fn list(
    requester: Requester,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Bookmark>>, AppError> {
    let access = requester.authorize(EndpointClass::PrivateData)?;
    let bookmarks = db::bookmarks::list(&state.pool, access.scope).await?;
    Ok(Json(bookmarks))
}

pub async fn create(
    requester: Requester,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CreateBookmark>,
) -> Result<(StatusCode, Json<Bookmark>), AppError> {
    let access = requester.authorize(EndpointClass::PrivateData)?;
    // Bookmarks always belong to whoever creates them.
    let owner = access.user()?.user_id;

    db::careers::find_by_id(&state.pool, req.career_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Career not found".to_string()))?;

    let bookmark = db::bookmarks::create(&state.pool, owner, req.career_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Career is already bookmarked".to_string())
            }
            _ => AppError::Database(e),
        })?;

    Ok((StatusCode::CREATED, Json(bookmark)))
}

pub async fn delete(
    requester: Requester,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let access = requester.authorize(EndpointClass::PrivateData)?;

    if !db::bookmarks::delete(&state.pool, id, access.scope).await? {
        return Err(AppError::NotFound("Bookmark not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Deleted")))
}
