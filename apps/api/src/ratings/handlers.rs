use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::rating::GameRatingRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SaveRatingRequest {
    pub session_id: Uuid,
    pub rating: i32,
}

/// POST /api/v1/games/:id/ratings
pub async fn handle_save_rating(
    State(state): State<AppState>,
    Path(board_game_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<SaveRatingRequest>,
) -> Result<Json<GameRatingRow>, AppError> {
    let user = state.users.resolve(&headers)?;
    let row = super::save_rating(
        &state.db,
        &user.user_id,
        board_game_id,
        req.session_id,
        req.rating,
    )
    .await?;
    Ok(Json(row))
}

#[derive(Deserialize)]
pub struct RatingQuery {
    pub session_id: Uuid,
}

/// GET /api/v1/games/:id/ratings?session_id=...
pub async fn handle_get_rating(
    State(state): State<AppState>,
    Path(board_game_id): Path<Uuid>,
    Query(params): Query<RatingQuery>,
    headers: HeaderMap,
) -> Result<Json<Option<GameRatingRow>>, AppError> {
    let user = state.users.resolve(&headers)?;
    let row =
        super::get_rating(&state.db, &user.user_id, board_game_id, params.session_id).await?;
    Ok(Json(row))
}

/// GET /api/v1/sessions/:id/ratings, the calling user's ratings in a session.
pub async fn handle_session_ratings(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<HashMap<Uuid, i32>>, AppError> {
    let user = state.users.resolve(&headers)?;
    let ratings = super::ratings_for_session(&state.db, &user.user_id, session_id).await?;
    Ok(Json(ratings))
}
