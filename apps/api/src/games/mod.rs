//! Board-game catalog: search, lookup, and creation. Names are unique
//! case-insensitively; enrichment owns every other field.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::game::BoardGameRow;

const MAX_SEARCH_RESULTS: i64 = 10;

/// Trims and validates a game name supplied by a caller.
pub fn normalize_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Board game name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub async fn search_games(pool: &PgPool, term: &str) -> Result<Vec<BoardGameRow>, AppError> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    let games = sqlx::query_as(
        "SELECT * FROM board_games
         WHERE name ILIKE '%' || $1 || '%'
         ORDER BY name
         LIMIT $2",
    )
    .bind(term)
    .bind(MAX_SEARCH_RESULTS)
    .fetch_all(pool)
    .await?;

    Ok(games)
}

pub async fn recent_games(pool: &PgPool, count: i64) -> Result<Vec<BoardGameRow>, AppError> {
    let games = sqlx::query_as("SELECT * FROM board_games ORDER BY created_at DESC LIMIT $1")
        .bind(count)
        .fetch_all(pool)
        .await?;
    Ok(games)
}

pub async fn get_game(pool: &PgPool, id: Uuid) -> Result<BoardGameRow, AppError> {
    let game: Option<BoardGameRow> = sqlx::query_as("SELECT * FROM board_games WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    game.ok_or_else(|| AppError::NotFound(format!("Board game {id} not found")))
}

/// One row of the catalog overview: the game plus whatever AI data its cache
/// holds. Games without a cache entry appear with `has_ai_data = false`.
#[derive(Debug, Serialize, FromRow)]
pub struct GameOverviewItem {
    pub board_game_id: Uuid,
    pub name: String,
    pub summary: Option<String>,
    pub complexity: Option<f64>,
    pub time_to_setup_minutes: Option<i32>,
    pub has_ai_data: bool,
    pub last_updated_at: Option<DateTime<Utc>>,
}

pub async fn game_overview(pool: &PgPool) -> Result<Vec<GameOverviewItem>, AppError> {
    let items = sqlx::query_as(
        "SELECT g.id AS board_game_id, g.name,
                c.summary, c.complexity, c.time_to_setup_minutes,
                COALESCE(c.has_ai_data, FALSE) AS has_ai_data,
                c.last_updated_at
         FROM board_games g
         LEFT JOIN board_game_caches c ON c.board_game_id = g.id
         ORDER BY g.name",
    )
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Creates a game with a fresh id. Duplicate names (case-insensitive) are a
/// caller mistake and rejected.
pub async fn create_game(pool: &PgPool, name: &str) -> Result<BoardGameRow, AppError> {
    let name = normalize_name(name)?;

    let existing: Option<BoardGameRow> =
        sqlx::query_as("SELECT * FROM board_games WHERE lower(name) = lower($1)")
            .bind(&name)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "A board game with the name '{name}' already exists"
        )));
    }

    let game = sqlx::query_as(
        "INSERT INTO board_games (id, name, created_at) VALUES ($1, $2, now()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .fetch_one(pool)
    .await?;

    Ok(game)
}

/// Looks a game up by name, creating it on first reference (used by
/// registration, where players type game names free-form).
pub async fn get_or_create_by_name(pool: &PgPool, name: &str) -> Result<BoardGameRow, AppError> {
    let name = normalize_name(name)?;

    // Races with concurrent registrations resolve against the unique
    // lower(name) index; the follow-up select sees whichever row won.
    sqlx::query(
        "INSERT INTO board_games (id, name, created_at) VALUES ($1, $2, now())
         ON CONFLICT ((lower(name))) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .execute(pool)
    .await?;

    let game = sqlx::query_as("SELECT * FROM board_games WHERE lower(name) = lower($1)")
        .bind(&name)
        .fetch_one(pool)
        .await?;

    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(normalize_name("  Azul  ").unwrap(), "Azul");
    }

    #[test]
    fn normalize_rejects_blank_names() {
        assert!(matches!(
            normalize_name("   "),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(normalize_name(""), Err(AppError::Validation(_))));
    }
}
