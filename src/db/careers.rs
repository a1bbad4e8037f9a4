use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Career;
use crate::policy::Scope;

/// Writable career fields.
pub struct CareerFields<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub domain: &'a str,
    pub required_skills: &'a [String],
    pub education_path: &'a str,
    pub expected_salary: &'a str,
}

pub async fn list(pool: &PgPool, domain: Option<&str>) -> Result<Vec<Career>, sqlx::Error> {
    sqlx::query_as::<_, Career>(
        "SELECT * FROM careers
         WHERE ($1::text IS NULL OR domain = $1)
         ORDER BY created_at DESC",
    )
    .bind(domain)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Career>, sqlx::Error> {
    sqlx::query_as::<_, Career>("SELECT * FROM careers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    fields: &CareerFields<'_>,
    created_by: Uuid,
) -> Result<Career, sqlx::Error> {
    sqlx::query_as::<_, Career>(
        "INSERT INTO careers
            (id, title, description, domain, required_skills, education_path, expected_salary, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.domain)
    .bind(Json(fields.required_skills))
    .bind(fields.education_path)
    .bind(fields.expected_salary)
    .bind(created_by)
    .fetch_one(pool)
    .await
}

/// Rows outside `scope` are invisible: the update simply matches nothing.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    scope: Scope,
    fields: &CareerFields<'_>,
) -> Result<Option<Career>, sqlx::Error> {
    sqlx::query_as::<_, Career>(
        "UPDATE careers
         SET title = $3, description = $4, domain = $5, required_skills = $6,
             education_path = $7, expected_salary = $8
         WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)
         RETURNING *",
    )
    .bind(id)
    .bind(scope.owner())
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.domain)
    .bind(Json(fields.required_skills))
    .bind(fields.education_path)
    .bind(fields.expected_salary)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, scope: Scope) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM careers WHERE id = $1 AND ($2::uuid IS NULL OR created_by = $2)",
    )
    .bind(id)
    .bind(scope.owner())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
