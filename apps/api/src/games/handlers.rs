use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::game::BoardGameRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// GET /api/v1/games/search?query=...
pub async fn handle_search_games(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<BoardGameRow>>, AppError> {
    let games = super::search_games(&state.db, &params.query).await?;
    Ok(Json(games))
}

/// GET /api/v1/games/overview
pub async fn handle_game_overview(
    State(state): State<AppState>,
) -> Result<Json<Vec<super::GameOverviewItem>>, AppError> {
    Ok(Json(super::game_overview(&state.db).await?))
}

/// GET /api/v1/games/recent
pub async fn handle_recent_games(
    State(state): State<AppState>,
) -> Result<Json<Vec<BoardGameRow>>, AppError> {
    let games = super::recent_games(&state.db, 5).await?;
    Ok(Json(games))
}

/// GET /api/v1/games/:id
pub async fn handle_get_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardGameRow>, AppError> {
    let game = super::get_game(&state.db, id).await?;
    Ok(Json(game))
}

#[derive(Deserialize)]
pub struct CreateGameRequest {
    pub name: String,
}

/// POST /api/v1/games
pub async fn handle_create_game(
    State(state): State<AppState>,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<BoardGameRow>), AppError> {
    let game = super::create_game(&state.db, &req.name).await?;
    Ok((StatusCode::CREATED, Json(game)))
}
