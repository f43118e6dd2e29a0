//! Recommendation engine: loads the catalog and rating aggregates, then
//! delegates the ranking to the pure functions in [`scoring`].

pub mod handlers;
pub mod scoring;

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::game::{BoardGameRow, CatalogGame, GameMetadataRow};
use scoring::RecommendationResult;

/// Produces up to three ranked suggestions for a user, or their top-rated
/// games in fallback mode when no unrated games remain.
pub async fn get_recommendations(
    pool: &PgPool,
    user_id: &str,
) -> Result<RecommendationResult, AppError> {
    let games = load_catalog(pool).await?;
    let user_ratings = load_user_ratings(pool, user_id).await?;
    let (average_ratings, rating_counts) = load_rating_aggregates(pool).await?;

    Ok(scoring::recommend(
        &games,
        &user_ratings,
        &average_ratings,
        &rating_counts,
        scoring::MAX_RECOMMENDATIONS,
    ))
}

/// Full catalog with classification metadata attached where present.
async fn load_catalog(pool: &PgPool) -> Result<Vec<CatalogGame>, AppError> {
    let games: Vec<BoardGameRow> =
        sqlx::query_as("SELECT * FROM board_games ORDER BY created_at, id")
            .fetch_all(pool)
            .await?;

    let metadata: Vec<GameMetadataRow> = sqlx::query_as("SELECT * FROM board_game_metadata")
        .fetch_all(pool)
        .await?;

    let mut by_game: HashMap<Uuid, GameMetadataRow> = metadata
        .into_iter()
        .map(|m| (m.board_game_id, m))
        .collect();

    Ok(games
        .into_iter()
        .map(|game| {
            let metadata = by_game.remove(&game.id);
            CatalogGame { game, metadata }
        })
        .collect())
}

/// The user's mean rating per game, across all sessions they rated it in.
async fn load_user_ratings(
    pool: &PgPool,
    user_id: &str,
) -> Result<HashMap<Uuid, f64>, AppError> {
    let rows: Vec<(Uuid, f64)> = sqlx::query_as(
        "SELECT board_game_id, AVG(rating)::float8
         FROM game_ratings
         WHERE user_id = $1
         GROUP BY board_game_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Global mean rating and rating count per game.
async fn load_rating_aggregates(
    pool: &PgPool,
) -> Result<(HashMap<Uuid, f64>, HashMap<Uuid, i64>), AppError> {
    let rows: Vec<(Uuid, f64, i64)> = sqlx::query_as(
        "SELECT board_game_id, AVG(rating)::float8, COUNT(*)
         FROM game_ratings
         GROUP BY board_game_id",
    )
    .fetch_all(pool)
    .await?;

    let mut averages = HashMap::with_capacity(rows.len());
    let mut counts = HashMap::with_capacity(rows.len());
    for (game_id, avg, count) in rows {
        averages.insert(game_id, avg);
        counts.insert(game_id, count);
    }
    Ok((averages, counts))
}
