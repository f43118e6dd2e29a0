use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BoardGameRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// AI-derived setup complexity, 1.0–5.0 when set.
    pub setup_complexity: Option<f64>,
    pub score: Option<f64>,
    pub average_playtime_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Classification record, at most one per game. Written only by the
/// enrichment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameMetadataRow {
    pub id: Uuid,
    pub board_game_id: Uuid,
    pub game_type: Option<String>,
    pub theme: Option<String>,
    pub player_interaction_level: Option<String>,
    pub skill_requirements: Option<String>,
    pub randomness_level: Option<String>,
    pub complexity_tier: Option<String>,
    pub target_audience: Option<String>,
    pub replayability_score: Option<i32>,
    pub learning_curve: Option<String>,
    pub typical_play_style: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Per-game AI enrichment cache, at most one active row per game.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameCacheRow {
    pub id: Uuid,
    pub board_game_id: Uuid,
    pub complexity: Option<f64>,
    pub time_to_setup_minutes: Option<i32>,
    pub summary: Option<String>,
    pub has_ai_data: bool,
    pub last_updated_at: DateTime<Utc>,
}

impl GameCacheRow {
    /// A cache entry counts as complete only when the flag is set AND the
    /// summary is non-blank. Partial writes stay eligible for re-processing.
    pub fn is_complete(&self) -> bool {
        self.has_ai_data
            && self
                .summary
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
    }
}

/// A catalog game with its optional classification, as consumed by the
/// recommendation engine.
#[derive(Debug, Clone)]
pub struct CatalogGame {
    pub game: BoardGameRow,
    pub metadata: Option<GameMetadataRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(has_ai_data: bool, summary: Option<&str>) -> GameCacheRow {
        GameCacheRow {
            id: Uuid::new_v4(),
            board_game_id: Uuid::new_v4(),
            complexity: Some(2.0),
            time_to_setup_minutes: Some(10),
            summary: summary.map(String::from),
            has_ai_data,
            last_updated_at: Utc::now(),
        }
    }

    #[test]
    fn complete_requires_flag_and_summary() {
        assert!(cache(true, Some("A fine game.")).is_complete());
    }

    #[test]
    fn flag_without_summary_is_incomplete() {
        assert!(!cache(true, None).is_complete());
        assert!(!cache(true, Some("   ")).is_complete());
    }

    #[test]
    fn summary_without_flag_is_incomplete() {
        assert!(!cache(false, Some("A fine game.")).is_complete());
    }
}
