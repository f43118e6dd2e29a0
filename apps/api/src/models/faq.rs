use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Cached FAQ answer, keyed by (game, question).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FaqCacheRow {
    pub id: Uuid,
    pub board_game_id: Uuid,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// One conversation per (game, user), created lazily on the first question.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub board_game_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationMessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
