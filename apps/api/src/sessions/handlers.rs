use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::{RegistrationRow, SessionRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub date: NaiveDate,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionRow>), AppError> {
    let session = super::create_session(&state.db, req.date).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionRow>>, AppError> {
    Ok(Json(super::list_sessions(&state.db).await?))
}

/// GET /api/v1/sessions/upcoming
pub async fn handle_upcoming_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionRow>>, AppError> {
    Ok(Json(super::upcoming_sessions(&state.db).await?))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub game_name: Option<String>,
}

/// GET /api/v1/sessions/history
pub async fn handle_session_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<super::SessionHistoryItem>>, AppError> {
    let user = state.users.resolve(&headers)?;
    let items = super::session_history(
        &state.db,
        &user.user_id,
        params.from_date,
        params.to_date,
        params.game_name.as_deref(),
    )
    .await?;
    Ok(Json(items))
}

/// POST /api/v1/sessions/:id/cancel
pub async fn handle_cancel_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    super::cancel_session(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub food_requirements: Option<String>,
    #[serde(default)]
    pub game_names: Vec<String>,
}

/// POST /api/v1/sessions/:id/registrations
pub async fn handle_register(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationRow>), AppError> {
    let user = state.users.resolve(&headers)?;
    let registration = super::register(
        &state.db,
        session_id,
        &user.user_id,
        &user.display_name,
        req.food_requirements,
        &req.game_names,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// GET /api/v1/sessions/:id/attendees
pub async fn handle_attendees(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<RegistrationRow>>, AppError> {
    Ok(Json(super::attendees(&state.db, session_id).await?))
}

#[derive(Deserialize)]
pub struct InterestRequest {
    pub board_game_id: Uuid,
}

/// POST /api/v1/sessions/:id/interest
pub async fn handle_record_interest(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<InterestRequest>,
) -> Result<StatusCode, AppError> {
    let user = state.users.resolve(&headers)?;
    super::record_interest(&state.db, session_id, req.board_game_id, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/:id/interest
pub async fn handle_session_interest(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<super::GameInterestCount>>, AppError> {
    Ok(Json(super::interest_for_session(&state.db, session_id).await?))
}
