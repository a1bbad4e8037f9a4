use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiJson, MessageResponse};
use crate::auth::extractor::Requester;
use crate::db;
use crate::db::quiz_questions::QuestionFields;
use crate::error::AppError;
use crate::models::quiz_question::QUESTION_KINDS;
use crate::models::{PublicQuizQuestion, QuizQuestion};
use crate::policy::EndpointClass;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct QuestionInput {
    pub question_text: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "empty_options")]
    pub options: serde_json::Value,
    pub correct_answer: Option<serde_json::Value>,
    #[serde(default = "default_weightage")]
    pub weightage: f64,
}

fn default_kind() -> String {
    "mcq".to_string()
}

fn empty_options() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

fn default_weightage() -> f64 {
    1.0
}

impl QuestionInput {
    fn fields(&self) -> Result<QuestionFields<'_>, AppError> {
        if self.question_text.trim().is_empty() {
            return Err(AppError::BadRequest("Question text is required".to_string()));
        }
        if !QUESTION_KINDS.contains(&self.kind.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Question kind must be one of: {}",
                QUESTION_KINDS.join(", ")
            )));
        }
        if !self.options.is_array() {
            return Err(AppError::BadRequest("Options must be a list".to_string()));
        }
        if !self.weightage.is_finite() || self.weightage < 0.0 {
            return Err(AppError::BadRequest(
                "Weightage must be a non-negative number".to_string(),
            ));
        }
        Ok(QuestionFields {
            question_text: self.question_text.trim(),
            kind: &self.kind,
            options: &self.options,
            correct_answer: self.correct_answer.as_ref(),
            weightage: self.weightage,
        })
    }
}

/// Quiz questions as shown to quiz takers, without answers.
pub async fn list_public(
    requester: Requester,
    State(state): State<SharedState>,
) -> Result<Json<Vec<PublicQuizQuestion>>, AppError> {
    requester.authorize(EndpointClass::PublicRead)?;
    let questions = db::quiz_questions::list(&state.pool).await?;
    Ok(Json(questions.into_iter().map(Into::into).collect()))
}

pub async fn list(
    requester: Requester,
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuizQuestion>>, AppError> {
    requester
        .authorize_current(EndpointClass::QuizAuthoring, state.users.as_ref())
        .await?;
    let questions = db::quiz_questions::list(&state.pool).await?;
    Ok(Json(questions))
}

pub async fn create(
    requester: Requester,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<QuestionInput>,
) -> Result<(StatusCode, Json<QuizQuestion>), AppError> {
    requester
        .authorize_current(EndpointClass::QuizAuthoring, state.users.as_ref())
        .await?;
    let question = db::quiz_questions::create(&state.pool, &req.fields()?).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn update(
    requester: Requester,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<QuestionInput>,
) -> Result<Json<QuizQuestion>, AppError> {
    requester
        .authorize_current(EndpointClass::QuizAuthoring, state.users.as_ref())
        .await?;
    let question = db::quiz_questions::update(&state.pool, id, &req.fields()?)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
    Ok(Json(question))
}

pub async fn delete(
    requester: Requester,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    requester
        .authorize_current(EndpointClass::QuizAuthoring, state.users.as_ref())
        .await?;
    if !db::quiz_questions::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Deleted")))
}
