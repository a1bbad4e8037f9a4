use sqlx::PgPool;
use uuid::Uuid;

use crate::models::QuizQuestion;

pub struct QuestionFields<'a> {
    pub question_text: &'a str,
    pub kind: &'a str,
    pub options: &'a serde_json::Value,
    pub correct_answer: Option<&'a serde_json::Value>,
    pub weightage: f64,
}

pub async fn list(pool: &PgPool) -> Result<Vec<QuizQuestion>, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>("SELECT * FROM quiz_questions ORDER BY created_at")
        .fetch_all(pool)
        .await
}

pub async fn create(pool: &PgPool, fields: &QuestionFields<'_>) -> Result<QuizQuestion, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>(
        "INSERT INTO quiz_questions (id, question_text, kind, options, correct_answer, weightage)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(fields.question_text)
    .bind(fields.kind)
    .bind(fields.options)
    .bind(fields.correct_answer)
    .bind(fields.weightage)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    fields: &QuestionFields<'_>,
) -> Result<Option<QuizQuestion>, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>(
        "UPDATE quiz_questions
         SET question_text = $2, kind = $3, options = $4, correct_answer = $5, weightage = $6
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(fields.question_text)
    .bind(fields.kind)
    .bind(fields.options)
    .bind(fields.correct_answer)
    .bind(fields.weightage)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quiz_questions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
