//! Storage seam for the enrichment worker.
//!
//! The worker depends on this trait rather than on `PgPool` directly so the
//! retry/idempotency logic can be tested against an in-memory fake.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ai::GameAiData;
use crate::models::game::GameCacheRow;

/// A game picked up by the scan: it has no cache entry, or an incomplete one.
#[derive(Debug, Clone)]
pub struct EnrichmentTarget {
    pub game_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Missing,
    Incomplete,
    Complete,
}

#[async_trait]
pub trait EnrichmentStore: Send + Sync {
    /// Games whose cache entry is absent, unflagged, or has a blank summary,
    /// in catalog order.
    async fn games_needing_enrichment(&self) -> Result<Vec<EnrichmentTarget>>;

    /// Freshest cache state for one game, for the pre-write idempotency check.
    async fn cache_state(&self, game_id: Uuid) -> Result<CacheState>;

    /// Writes one game's enrichment atomically: game row, cache upsert, and
    /// metadata upsert commit together or not at all.
    async fn persist_enrichment(&self, game_id: Uuid, data: &GameAiData) -> Result<()>;
}

pub struct PgEnrichmentStore {
    pool: PgPool,
}

impl PgEnrichmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrichmentStore for PgEnrichmentStore {
    async fn games_needing_enrichment(&self) -> Result<Vec<EnrichmentTarget>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT g.id, g.name
             FROM board_games g
             LEFT JOIN board_game_caches c ON c.board_game_id = g.id
             WHERE c.id IS NULL
                OR NOT c.has_ai_data
                OR c.summary IS NULL
                OR btrim(c.summary) = ''
             ORDER BY g.created_at, g.id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(game_id, name)| EnrichmentTarget { game_id, name })
            .collect())
    }

    async fn cache_state(&self, game_id: Uuid) -> Result<CacheState> {
        let cache: Option<GameCacheRow> =
            sqlx::query_as("SELECT * FROM board_game_caches WHERE board_game_id = $1")
                .bind(game_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match cache {
            None => CacheState::Missing,
            Some(c) if c.is_complete() => CacheState::Complete,
            Some(_) => CacheState::Incomplete,
        })
    }

    async fn persist_enrichment(&self, game_id: Uuid, data: &GameAiData) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE board_games
             SET setup_complexity = $2,
                 score = $2,
                 description = $3,
                 average_playtime_minutes = $4,
                 last_updated_at = now()
             WHERE id = $1",
        )
        .bind(game_id)
        .bind(data.complexity)
        .bind(&data.summary)
        .bind(data.average_playtime_minutes)
        .execute(&mut *tx)
        .await?;

        // Reuse-or-create on the game's identity: a single id-keyed cache row
        // per game, regardless of which code path created it first.
        sqlx::query(
            "INSERT INTO board_game_caches
                 (id, board_game_id, complexity, time_to_setup_minutes, summary, has_ai_data, last_updated_at)
             VALUES ($1, $2, $3, $4, $5, TRUE, now())
             ON CONFLICT (board_game_id) DO UPDATE SET
                 complexity = EXCLUDED.complexity,
                 time_to_setup_minutes = EXCLUDED.time_to_setup_minutes,
                 summary = EXCLUDED.summary,
                 has_ai_data = TRUE,
                 last_updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(game_id)
        .bind(data.complexity)
        .bind(data.time_to_setup_minutes)
        .bind(&data.summary)
        .execute(&mut *tx)
        .await?;

        if data.has_classification() {
            sqlx::query(
                "INSERT INTO board_game_metadata
                     (id, board_game_id, game_type, theme, player_interaction_level,
                      skill_requirements, randomness_level, complexity_tier, target_audience,
                      replayability_score, learning_curve, typical_play_style,
                      created_at, last_updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now(), now())
                 ON CONFLICT (board_game_id) DO UPDATE SET
                     game_type = EXCLUDED.game_type,
                     theme = EXCLUDED.theme,
                     player_interaction_level = EXCLUDED.player_interaction_level,
                     skill_requirements = EXCLUDED.skill_requirements,
                     randomness_level = EXCLUDED.randomness_level,
                     complexity_tier = EXCLUDED.complexity_tier,
                     target_audience = EXCLUDED.target_audience,
                     replayability_score = EXCLUDED.replayability_score,
                     learning_curve = EXCLUDED.learning_curve,
                     typical_play_style = EXCLUDED.typical_play_style,
                     last_updated_at = now()",
            )
            .bind(Uuid::new_v4())
            .bind(game_id)
            .bind(&data.game_type)
            .bind(&data.theme)
            .bind(&data.player_interaction_level)
            .bind(&data.skill_requirements)
            .bind(&data.randomness_level)
            .bind(&data.complexity_tier)
            .bind(&data.target_audience)
            .bind(data.replayability_score)
            .bind(&data.learning_curve)
            .bind(&data.typical_play_style)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
