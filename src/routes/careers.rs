use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiJson, MessageResponse};
use crate::auth::extractor::Requester;
use crate::db;
use crate::db::careers::CareerFields;
use crate::error::AppError;
use crate::models::Career;
use crate::policy::EndpointClass;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CareerInput {
    pub title: String,
    pub description: String,
    pub domain: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub education_path: String,
    #[serde(default)]
    pub expected_salary: String,
}

#[derive(Deserialize)]
pub struct CareerFilter {
    pub domain: Option<String>,
}

impl CareerInput {
    fn fields(&self) -> Result<CareerFields<'_>, AppError> {
        if self.title.trim().is_empty() || self.domain.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Title and domain are required".to_string(),
            ));
        }
        if self.title.len() > 255 {
            return Err(AppError::BadRequest(
                "Title must be at most 255 characters".to_string(),
            ));
        }
        Ok(CareerFields {
            title: self.title.trim(),
            description: &self.description,
            domain: self.domain.trim(),
            required_skills: &self.required_skills,
            education_path: &self.education_path,
            expected_salary: &self.expected_salary,
        })
    }
}

pub async fn list(
    requester: Requester,
    State(state): State<SharedState>,
    Query(filter): Query<CareerFilter>,
) -> Result<Json<Vec<Career>>, AppError> {
    requester.authorize(EndpointClass::PublicRead)?;
    let careers = db::careers::list(&state.pool, filter.domain.as_deref()).await?;
    Ok(Json(careers))
}

pub async fn get(
    requester: Requester,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Career>, AppError> {
    requester.authorize(EndpointClass::PublicRead)?;
    let career = db::careers::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Career not found".to_string()))?;
    Ok(Json(career))
}

pub async fn create(
    requester: Requester,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CareerInput>,
) -> Result<(StatusCode, Json<Career>), AppError> {
    let access = requester.authorize(EndpointClass::PublicWrite)?;
    let author = access.user()?.user_id;

    let career = db::careers::create(&state.pool, &req.fields()?, author).await?;
    tracing::info!(career_id = %career.id, %author, "Career created");

    Ok((StatusCode::CREATED, Json(career)))
}

pub async fn update(
    requester: Requester,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<CareerInput>,
) -> Result<Json<Career>, AppError> {
    let access = requester.authorize(EndpointClass::PublicWrite)?;

    let career = db::careers::update(&state.pool, id, access.scope, &req.fields()?)
        .await?
        .ok_or_else(|| AppError::NotFound("Career not found".to_string()))?;

    Ok(Json(career))
}

pub async fn delete(
    requester: Requester,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let access = requester.authorize(EndpointClass::PublicWrite)?;

    if !db::careers::delete(&state.pool, id, access.scope).await? {
        return Err(AppError::NotFound("Career not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Deleted")))
}
