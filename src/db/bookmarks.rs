use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Bookmark;
use crate::policy::Scope;

pub async fn list(pool: &PgPool, scope: Scope) -> Result<Vec<Bookmark>, sqlx::Error> {
    sqlx::query_as::<_, Bookmark>(
        "SELECT * FROM bookmarks
         WHERE ($1::uuid IS NULL OR user_id = $1)
         ORDER BY created_at DESC",
    )
    .bind(scope.owner())
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, user_id: Uuid, career_id: Uuid) -> Result<Bookmark, sqlx::Error> {
    sqlx::query_as::<_, Bookmark>(
        "INSERT INTO bookmarks (id, user_id, career_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(career_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, scope: Scope) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM bookmarks WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)",
    )
    .bind(id)
    .bind(scope.owner())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
