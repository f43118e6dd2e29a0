use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One star rating per (user, game, session) triple. Re-saving updates the
/// row in place and refreshes `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameRatingRow {
    pub id: Uuid,
    pub user_id: String,
    pub board_game_id: Uuid,
    pub session_id: Uuid,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
