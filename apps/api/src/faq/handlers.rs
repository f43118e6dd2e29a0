use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::games;
use crate::models::faq::ConversationMessageRow;
use crate::state::AppState;

/// GET /api/v1/faq/questions
pub async fn handle_common_questions() -> Json<Vec<&'static str>> {
    Json(super::common_questions().to_vec())
}

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// POST /api/v1/games/:id/faq
pub async fn handle_ask(
    State(state): State<AppState>,
    Path(board_game_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> Result<Json<super::FaqAnswer>, AppError> {
    let user = state.users.resolve(&headers)?;
    let game = games::get_game(&state.db, board_game_id).await?;
    let answer =
        super::get_answer(&state.db, state.ai.as_ref(), &game, &req.question, &user.user_id)
            .await?;
    Ok(Json(answer))
}

#[derive(Serialize)]
pub struct FollowUpResponse {
    pub answer: String,
}

/// POST /api/v1/faq/conversations/:id/follow-up
pub async fn handle_follow_up(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> Result<Json<FollowUpResponse>, AppError> {
    let user = state.users.resolve(&headers)?;
    let conversation = super::get_conversation(&state.db, conversation_id).await?;
    let game = games::get_game(&state.db, conversation.board_game_id).await?;
    let answer = super::follow_up(
        &state.db,
        state.ai.as_ref(),
        &game,
        conversation_id,
        &req.question,
        &user.user_id,
    )
    .await?;
    Ok(Json(FollowUpResponse { answer }))
}

/// GET /api/v1/faq/conversations/:id
pub async fn handle_history(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConversationMessageRow>>, AppError> {
    let user = state.users.resolve(&headers)?;
    let conversation = super::get_conversation(&state.db, conversation_id).await?;
    if conversation.user_id != user.user_id {
        return Err(AppError::NotFound(format!(
            "Conversation {conversation_id} not found"
        )));
    }
    Ok(Json(super::conversation_history(&state.db, conversation_id).await?))
}
