use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Career {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub domain: String,
    pub required_skills: serde_json::Value,
    pub education_path: String,
    pub expected_salary: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
