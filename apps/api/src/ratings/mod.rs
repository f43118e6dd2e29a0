//! Star ratings: one per (user, game, session) triple, 0–5.

pub mod handlers;

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::games;
use crate::models::rating::GameRatingRow;
use crate::sessions;

/// Ratings outside 0–5 are caller mistakes, rejected at the boundary.
pub fn validate_rating(rating: i32) -> Result<(), AppError> {
    if !(0..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 0 and 5".to_string(),
        ));
    }
    Ok(())
}

/// Upserts a rating for the triple; re-saving updates in place and refreshes
/// `updated_at`.
pub async fn save_rating(
    pool: &PgPool,
    user_id: &str,
    board_game_id: Uuid,
    session_id: Uuid,
    rating: i32,
) -> Result<GameRatingRow, AppError> {
    validate_rating(rating)?;
    games::get_game(pool, board_game_id).await?;
    sessions::get_session(pool, session_id).await?;

    let row = sqlx::query_as(
        "INSERT INTO game_ratings (id, user_id, board_game_id, session_id, rating, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, now(), now())
         ON CONFLICT (user_id, board_game_id, session_id) DO UPDATE SET
             rating = EXCLUDED.rating,
             updated_at = now()
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(board_game_id)
    .bind(session_id)
    .bind(rating)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// The user's rating of one game in one session, if any.
pub async fn get_rating(
    pool: &PgPool,
    user_id: &str,
    board_game_id: Uuid,
    session_id: Uuid,
) -> Result<Option<GameRatingRow>, AppError> {
    let row = sqlx::query_as(
        "SELECT * FROM game_ratings
         WHERE user_id = $1 AND board_game_id = $2 AND session_id = $3",
    )
    .bind(user_id)
    .bind(board_game_id)
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// The user's ratings within one session, keyed by game.
pub async fn ratings_for_session(
    pool: &PgPool,
    user_id: &str,
    session_id: Uuid,
) -> Result<HashMap<Uuid, i32>, AppError> {
    let rows: Vec<(Uuid, i32)> = sqlx::query_as(
        "SELECT board_game_id, rating FROM game_ratings
         WHERE user_id = $1 AND session_id = $2",
    )
    .bind(user_id)
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_full_star_range() {
        for rating in 0..=5 {
            assert!(validate_rating(rating).is_ok());
        }
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        assert!(matches!(validate_rating(-1), Err(AppError::Validation(_))));
        assert!(matches!(validate_rating(6), Err(AppError::Validation(_))));
    }
}
