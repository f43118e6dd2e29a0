use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::GameAi;
use crate::auth::UserContextProvider;
use crate::config::Config;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub ai: Arc<dyn GameAi>,
    pub users: Arc<dyn UserContextProvider>,
    pub config: Config,
}
