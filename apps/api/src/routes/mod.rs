pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::faq::handlers as faq_handlers;
use crate::games::handlers as game_handlers;
use crate::ratings::handlers as rating_handlers;
use crate::recommendations::handlers as rec_handlers;
use crate::sessions::handlers as session_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Games
        .route("/api/v1/games", post(game_handlers::handle_create_game))
        .route("/api/v1/games/search", get(game_handlers::handle_search_games))
        .route(
            "/api/v1/games/overview",
            get(game_handlers::handle_game_overview),
        )
        .route("/api/v1/games/recent", get(game_handlers::handle_recent_games))
        .route("/api/v1/games/:id", get(game_handlers::handle_get_game))
        // Ratings
        .route(
            "/api/v1/games/:id/ratings",
            get(rating_handlers::handle_get_rating).post(rating_handlers::handle_save_rating),
        )
        // Recommendations
        .route(
            "/api/v1/recommendations",
            get(rec_handlers::handle_get_recommendations),
        )
        // Sessions
        .route(
            "/api/v1/sessions",
            get(session_handlers::handle_list_sessions)
                .post(session_handlers::handle_create_session),
        )
        .route(
            "/api/v1/sessions/upcoming",
            get(session_handlers::handle_upcoming_sessions),
        )
        .route(
            "/api/v1/sessions/history",
            get(session_handlers::handle_session_history),
        )
        .route(
            "/api/v1/sessions/:id/cancel",
            post(session_handlers::handle_cancel_session),
        )
        .route(
            "/api/v1/sessions/:id/registrations",
            post(session_handlers::handle_register),
        )
        .route(
            "/api/v1/sessions/:id/attendees",
            get(session_handlers::handle_attendees),
        )
        .route(
            "/api/v1/sessions/:id/interest",
            get(session_handlers::handle_session_interest)
                .post(session_handlers::handle_record_interest),
        )
        .route(
            "/api/v1/sessions/:id/ratings",
            get(rating_handlers::handle_session_ratings),
        )
        // FAQ
        .route(
            "/api/v1/faq/questions",
            get(faq_handlers::handle_common_questions),
        )
        .route("/api/v1/games/:id/faq", post(faq_handlers::handle_ask))
        .route(
            "/api/v1/faq/conversations/:id",
            get(faq_handlers::handle_history),
        )
        .route(
            "/api/v1/faq/conversations/:id/follow-up",
            post(faq_handlers::handle_follow_up),
        )
        .with_state(state)
}
