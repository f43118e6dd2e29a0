use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub session_date: NaiveDate,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: String,
    pub user_display_name: String,
    pub food_requirements: Option<String>,
    pub created_at: DateTime<Utc>,
}
