use axum::{extract::State, http::HeaderMap, Json};

use crate::errors::AppError;
use crate::recommendations::scoring::RecommendationResult;
use crate::state::AppState;

/// GET /api/v1/recommendations
pub async fn handle_get_recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RecommendationResult>, AppError> {
    let user = state.users.resolve(&headers)?;
    let result = super::get_recommendations(&state.db, &user.user_id).await?;
    Ok(Json(result))
}
