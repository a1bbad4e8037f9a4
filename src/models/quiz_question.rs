use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub question_text: String,
    pub kind: String,
    pub options: serde_json::Value,
    pub correct_answer: Option<serde_json::Value>,
    pub weightage: f64,
    pub created_at: DateTime<Utc>,
}

/// What quiz takers see: the answer key stays with the authors.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuizQuestion {
    pub id: Uuid,
    pub question_text: String,
    pub kind: String,
    pub options: serde_json::Value,
    pub weightage: f64,
}

impl From<QuizQuestion> for PublicQuizQuestion {
    fn from(q: QuizQuestion) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            kind: q.kind,
            options: q.options,
            weightage: q.weightage,
        }
    }
}

pub const QUESTION_KINDS: [&str; 3] = ["mcq", "text", "likert"];
